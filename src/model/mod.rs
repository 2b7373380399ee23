//! SQL model nodes and their builders.
//!
//! - [`spec`] - the `ModelSpec` capability trait and `TemplateSpec`
//! - [`template`] - `{name}` / `{{name}}` placeholder scanning
//! - [`builder`] - `ModelBuilder`, the mutable accumulator
//! - [`node`] - `Model`, the shared immutable node
//! - [`materialization`] - how a node is emitted
//! - [`property`] - property values and their default formatting
//! - [`hash`] - content hashing

pub mod builder;
pub mod hash;
pub mod materialization;
pub mod node;
pub mod property;
pub mod spec;
pub mod template;

pub use builder::{
    instantiate_recursively, BuilderState, ModelBuilder, ReferenceValue, SharedBuilder, Value,
};
pub use materialization::Materialization;
pub use node::Model;
pub use property::{format_value, PropertyValue};
pub use spec::{validate_spec, ModelSpec, SpecRef, TemplateSpec};

use crate::error::GraphResult;

/// Start building a node from `spec`.
pub fn build(spec: impl ModelSpec + 'static) -> GraphResult<ModelBuilder> {
    ModelBuilder::new(spec)
}
