//! Token-based SQL expressions.
//!
//! An [`Expression`] is an ordered sequence of [`ExpressionToken`]s. It is
//! assembled from small pieces with [`Expression::construct`], has its
//! column references resolved against a relation alias, and is finally
//! serialized with [`Expression::to_sql`].
//!
//! ```ignore
//! use sqlgraph::sql::expr::{col, lit_str, Expression};
//!
//! let cond = Expression::construct("{} = {}", &[col("status"), lit_str("open")])?;
//! let sql = cond.resolve_column_references(Some("l")).to_sql()?;
//! assert_eq!(sql, "\"l\".\"status\" = 'open'");
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use super::token::ExpressionToken;
use crate::error::{GraphError, GraphResult};

/// Splice marker used by [`Expression::construct`].
const SPLICE: &str = "{}";

/// An SQL fragment as a sequence of tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Expression {
    tokens: Vec<ExpressionToken>,
}

impl Expression {
    /// Create an expression from a token sequence.
    pub fn new(tokens: Vec<ExpressionToken>) -> Self {
        Self { tokens }
    }

    /// Single raw-text token.
    pub fn raw(text: impl Into<String>) -> Self {
        Self::new(vec![ExpressionToken::Raw(text.into())])
    }

    /// Single string-literal token.
    pub fn string_literal(value: impl Into<String>) -> Self {
        Self::new(vec![ExpressionToken::StringLiteral(value.into())])
    }

    /// Single unresolved column reference.
    pub fn column_reference(name: impl Into<String>) -> Self {
        Self::new(vec![ExpressionToken::ColumnReference(name.into())])
    }

    /// Splice `args` into `template` at each `{}`.
    ///
    /// The literal pieces between markers become `Raw` tokens; each
    /// argument contributes its own tokens unchanged.
    pub fn construct(template: &str, args: &[Expression]) -> GraphResult<Self> {
        let pieces: Vec<&str> = template.split(SPLICE).collect();
        let slots = pieces.len() - 1;
        if slots != args.len() {
            return Err(GraphError::TemplateArity {
                expected: slots,
                found: args.len(),
            });
        }

        let mut tokens = Vec::new();
        for (i, piece) in pieces.iter().enumerate() {
            if !piece.is_empty() {
                tokens.push(ExpressionToken::Raw((*piece).to_string()));
            }
            if let Some(arg) = args.get(i) {
                tokens.extend(arg.tokens.iter().cloned());
            }
        }

        Ok(Self { tokens })
    }

    /// Return a copy with every column reference resolved to a quoted
    /// identifier, qualified by `alias` when given.
    pub fn resolve_column_references(&self, alias: Option<&str>) -> Self {
        Self {
            tokens: self.tokens.iter().map(|t| t.resolve(alias)).collect(),
        }
    }

    /// Serialize to SQL text.
    ///
    /// Fails with [`GraphError::UnresolvedReference`] if any column
    /// reference is still unresolved.
    pub fn to_sql(&self) -> GraphResult<String> {
        let mut out = String::new();
        for token in &self.tokens {
            out.push_str(&token.serialize()?);
        }
        Ok(out)
    }

    /// The tokens of this expression.
    pub fn tokens(&self) -> &[ExpressionToken] {
        &self.tokens
    }

    /// Names of unresolved column references, in order of appearance.
    pub fn column_references(&self) -> Vec<&str> {
        self.tokens
            .iter()
            .filter_map(|t| match t {
                ExpressionToken::ColumnReference(name) => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    /// True once no column reference remains.
    pub fn is_resolved(&self) -> bool {
        !self.tokens.iter().any(ExpressionToken::is_column_reference)
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }
}

impl From<Vec<ExpressionToken>> for Expression {
    fn from(tokens: Vec<ExpressionToken>) -> Self {
        Self::new(tokens)
    }
}

impl fmt::Display for Expression {
    /// Debug-friendly rendering: unresolved references show as `{name}`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for token in &self.tokens {
            match token {
                ExpressionToken::ColumnReference(name) => write!(f, "{{{}}}", name)?,
                other => match other.serialize() {
                    Ok(s) => f.write_str(&s)?,
                    Err(_) => return Err(fmt::Error),
                },
            }
        }
        Ok(())
    }
}

// =============================================================================
// Builder DSL
// =============================================================================

/// Create a raw SQL expression.
pub fn raw(text: &str) -> Expression {
    Expression::raw(text)
}

/// Create a string literal.
pub fn lit_str(s: &str) -> Expression {
    Expression::string_literal(s)
}

/// Create an unresolved column reference.
pub fn col(name: &str) -> Expression {
    Expression::column_reference(name)
}
