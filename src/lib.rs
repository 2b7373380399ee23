//! # sqlgraph
//!
//! Build SQL as a graph of small, parameterized, content-hashed models and
//! compile it into one statement per materialized node.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │        ModelSpec (template + declared names)             │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [ModelBuilder]
//! ┌─────────────────────────────────────────────────────────┐
//! │        Model (immutable, shared, content-hashed)         │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [graph / join]
//! ┌─────────────────────────────────────────────────────────┐
//! │        Rewritten graph (copy-on-write replacement)       │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [compile]
//! ┌─────────────────────────────────────────────────────────┐
//! │        SQL statements (CTEs inlined, tables first)       │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod compile;
pub mod config;
pub mod error;
pub mod graph;
pub mod join;
pub mod model;
pub mod sql;

pub use error::{GraphError, GraphResult};

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::compile::{compile_one, compile_reachable, Compiler};
    pub use crate::config::{CompilerSettings, Settings};
    pub use crate::error::{GraphError, GraphResult};
    pub use crate::graph::{
        find_all_nodes, find_node, node_at_path, reachable_nodes, replace_node_in_graph,
        ReferencePath,
    };
    pub use crate::join::{realias_expression, JoinBuilder, JoinSide, JoinType};
    pub use crate::model::{
        build, instantiate_recursively, Materialization, Model, ModelBuilder, ModelSpec,
        PropertyValue, TemplateSpec,
    };
    pub use crate::sql::{col, lit_str, raw, Expression, ExpressionToken};
}

pub use compile::{compile_one, compile_reachable};
pub use model::{Materialization, Model, ModelBuilder, ModelSpec, TemplateSpec};
pub use sql::{Expression, ExpressionToken};
