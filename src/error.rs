//! Error types for graph construction, graph operations and compilation.
//!
//! Every error here is a usage error surfaced at the point of detection.
//! Nothing is retried and no partial result is returned.

use thiserror::Error;

/// Result type for model graph operations.
pub type GraphResult<T> = Result<T, GraphError>;

/// Errors raised while building, rewriting or compiling a model graph.
#[derive(Error, Debug)]
pub enum GraphError {
    /// A builder was given a name its template does not declare, or was
    /// instantiated while a declared name was still unset.
    #[error("spec mismatch for '{model}': {message}")]
    SpecMismatch { model: String, message: String },

    /// A value supplied for a reference name is not a Model or Builder.
    #[error("reference '{name}' of '{model}' must be a model or builder")]
    ReferenceTypeError { model: String, name: String },

    /// A Model or Builder was supplied for a property name.
    #[error("property '{name}' of '{model}' must be a plain value, not a model")]
    PropertyTypeError { model: String, name: String },

    /// Recursive instantiation of builder references loops back on itself.
    #[error("cyclic builder references: {}", .0.join(" -> "))]
    CycleError(Vec<String>),

    /// Two fragments share a generated name but carry different SQL.
    #[error("name conflict: '{name}' is bound to two different SQL fragments")]
    NameConflict { name: String },

    /// Two models share a hash but disagree on how they are materialized.
    #[error("hash ambiguity: models with hash {hash} differ in materialization ({first} vs {second})")]
    HashAmbiguity {
        hash: String,
        first: String,
        second: String,
    },

    /// An expression still holds a column reference at serialization time.
    #[error("unresolved column reference '{column}'")]
    UnresolvedReference { column: String },

    /// A reference path does not exist in the graph.
    #[error("reference path not found: {path}")]
    PathNotFound { path: String },

    /// A joined expression references a column outside both lineages.
    #[error("column '{column}' cannot be traced to either side of the join")]
    UntraceableReference { column: String },

    /// `Expression::construct` got a different number of arguments than `{}` slots.
    #[error("template has {expected} placeholder(s) but {found} argument(s) were given")]
    TemplateArity { expected: usize, found: usize },

    /// A template opens a `with` clause that cannot be split into fragments.
    #[error("malformed template for '{model}': {message}")]
    MalformedTemplate { model: String, message: String },

    /// A VIRTUAL node was asked to compile as a statement.
    #[error("'{model}' is virtual and is never emitted")]
    VirtualModel { model: String },

    /// Failed to serialize the digest document of a model.
    #[error("failed to compute model hash: {0}")]
    Hash(#[from] serde_json::Error),
}

impl GraphError {
    pub(crate) fn spec_mismatch(model: &str, message: impl Into<String>) -> Self {
        GraphError::SpecMismatch {
            model: model.to_string(),
            message: message.into(),
        }
    }
}
