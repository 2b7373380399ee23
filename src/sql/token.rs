//! Expression tokens - the atomic units of an SQL fragment.
//!
//! A token is either text that goes to the output verbatim, a string
//! literal that is quoted on output, or a column reference that must be
//! resolved to a concrete (optionally alias-qualified) identifier before
//! the fragment can be serialized.

use serde::{Deserialize, Serialize};

use super::quote::{quote_identifier, quote_string};
use crate::error::{GraphError, GraphResult};

/// One element of an [`Expression`](super::expr::Expression).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExpressionToken {
    /// SQL text passed to the output without escaping.
    ///
    /// Never build this from user input; use `StringLiteral` for values.
    Raw(String),
    /// Unescaped string value, quoted on output.
    StringLiteral(String),
    /// Column name waiting to be resolved against some relation.
    ColumnReference(String),
}

impl ExpressionToken {
    /// Serialize this token to SQL text.
    ///
    /// Fails on an unresolved `ColumnReference`.
    pub fn serialize(&self) -> GraphResult<String> {
        match self {
            ExpressionToken::Raw(s) => Ok(s.clone()),
            ExpressionToken::StringLiteral(s) => Ok(quote_string(s)),
            ExpressionToken::ColumnReference(name) => Err(GraphError::UnresolvedReference {
                column: name.clone(),
            }),
        }
    }

    /// Resolve a column reference to a quoted identifier, prefixed with
    /// the quoted alias when one is given. Other tokens are returned as-is.
    pub fn resolve(&self, alias: Option<&str>) -> ExpressionToken {
        match self {
            ExpressionToken::ColumnReference(name) => {
                let ident = match alias {
                    Some(a) => format!("{}.{}", quote_identifier(a), quote_identifier(name)),
                    None => quote_identifier(name),
                };
                ExpressionToken::Raw(ident)
            }
            other => other.clone(),
        }
    }

    /// Is this an unresolved column reference?
    pub fn is_column_reference(&self) -> bool {
        matches!(self, ExpressionToken::ColumnReference(_))
    }
}
