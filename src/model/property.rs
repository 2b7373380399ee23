//! Property values substituted into `{name}` placeholders.

use serde::{Deserialize, Serialize};

use crate::error::GraphResult;
use crate::join::ColumnLineage;
use crate::sql::expr::Expression;
use crate::sql::quote::quote_identifier;

/// An immutable, comparable value bound to a property name.
///
/// The template owns quoting: `Text` is inserted verbatim, while
/// `Identifier` is quoted on the way out.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyValue {
    Null,
    Bool(bool),
    Int(i64),
    /// Inserted verbatim.
    Text(String),
    /// Inserted as a quoted identifier.
    Identifier(String),
    /// Inserted as its SQL text; must be fully resolved.
    Expression(Expression),
    /// Items formatted one by one and joined with `", "`.
    List(Vec<PropertyValue>),
    /// Select list of a join, one entry per output column.
    Lineage(Vec<ColumnLineage>),
}

impl PropertyValue {
    pub fn as_expression(&self) -> Option<&Expression> {
        match self {
            PropertyValue::Expression(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_lineage(&self) -> Option<&[ColumnLineage]> {
        match self {
            PropertyValue::Lineage(cols) => Some(cols),
            _ => None,
        }
    }
}

/// Default rendering of a property value into template text.
pub fn format_value(value: &PropertyValue) -> GraphResult<String> {
    Ok(match value {
        PropertyValue::Null => "null".to_string(),
        PropertyValue::Bool(b) => b.to_string(),
        PropertyValue::Int(n) => n.to_string(),
        PropertyValue::Text(s) => s.clone(),
        PropertyValue::Identifier(s) => quote_identifier(s),
        PropertyValue::Expression(e) => e.to_sql()?,
        PropertyValue::List(items) => items
            .iter()
            .map(format_value)
            .collect::<GraphResult<Vec<_>>>()?
            .join(", "),
        PropertyValue::Lineage(cols) => cols
            .iter()
            .map(ColumnLineage::to_select_item)
            .collect::<GraphResult<Vec<_>>>()?
            .join(", "),
    })
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::Text(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::Text(s)
    }
}

impl From<i64> for PropertyValue {
    fn from(n: i64) -> Self {
        PropertyValue::Int(n)
    }
}

impl From<i32> for PropertyValue {
    fn from(n: i32) -> Self {
        PropertyValue::Int(n.into())
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Bool(b)
    }
}

impl From<Expression> for PropertyValue {
    fn from(e: Expression) -> Self {
        PropertyValue::Expression(e)
    }
}

impl From<Vec<PropertyValue>> for PropertyValue {
    fn from(items: Vec<PropertyValue>) -> Self {
        PropertyValue::List(items)
    }
}
