//! How a model is realized in the generated SQL.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Materialization of a model.
///
/// | variant    | statement | cte   | modifies db |
/// |------------|-----------|-------|-------------|
/// | Cte        | no        | yes   | no          |
/// | Query      | yes       | yes   | no          |
/// | View       | yes       | no    | yes         |
/// | Table      | yes       | no    | yes         |
/// | TempTable  | yes       | no    | no          |
/// | Virtual    | no        | no    | no          |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Materialization {
    /// Inlined into its dependents as a common table expression.
    #[default]
    Cte,
    /// A bare select statement.
    Query,
    /// `create view`.
    View,
    /// `create table`.
    Table,
    /// `create temporary table ... on commit drop`.
    TempTable,
    /// Pure grouping node, never emitted.
    Virtual,
}

impl Materialization {
    /// Does this node become a standalone statement?
    pub fn is_statement(self) -> bool {
        matches!(
            self,
            Materialization::Query
                | Materialization::View
                | Materialization::Table
                | Materialization::TempTable
        )
    }

    /// Is this node inlined as a CTE when referenced?
    pub fn is_cte(self) -> bool {
        matches!(self, Materialization::Cte | Materialization::Query)
    }

    /// Does emitting this node leave a persistent object in the database?
    pub fn modifies_db(self) -> bool {
        matches!(self, Materialization::View | Materialization::Table)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Materialization::Cte => "cte",
            Materialization::Query => "query",
            Materialization::View => "view",
            Materialization::Table => "table",
            Materialization::TempTable => "temp_table",
            Materialization::Virtual => "virtual",
        }
    }
}

impl fmt::Display for Materialization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
