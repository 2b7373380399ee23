//! SQL text primitives.
//!
//! - [`quote`] - identifier and string quoting
//! - [`token`] - expression tokens
//! - [`expr`] - expressions with deferred column resolution

pub mod expr;
pub mod quote;
pub mod token;

pub use expr::{col, lit_str, raw, Expression};
pub use quote::{quote_identifier, quote_string, truncate_name, unquote_identifier, unquote_string};
pub use token::ExpressionToken;
