//! Joining two independently built graphs.
//!
//! A join node selects from its `left` input aliased `"l"` and its
//! `right` input aliased `"r"`. It records, per output column, which side
//! the column comes from and the expression (relative to that side) that
//! produced it. That record lets [`realias_expression`] trace a column
//! reference through any number of earlier joins back to the two inputs
//! of a new join.
//!
//! ```text
//! J3 = join(J1, J2)          J1 = join(A, B), J2 = join(C, D)
//! expr over J3: a and d
//! realias into join(J1, J2)  ->  "l"."a" and "r"."d"
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{GraphError, GraphResult};
use crate::model::{Materialization, Model, ModelBuilder, PropertyValue, TemplateSpec};
use crate::sql::expr::Expression;
use crate::sql::quote::quote_identifier;
use crate::sql::token::ExpressionToken;

/// Template shared by every join node.
pub const JOIN_TEMPLATE: &str =
    "select {columns} from {{left}} as \"l\" {how} join {{right}} as \"r\" on {condition}";

/// Display label of join nodes.
pub const JOIN_NAME: &str = "join";

/// Which input of a join a column comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JoinSide {
    Left,
    Right,
}

impl JoinSide {
    /// Relation alias inside the join's select.
    pub fn alias(self) -> &'static str {
        match self {
            JoinSide::Left => "l",
            JoinSide::Right => "r",
        }
    }

    /// Reference name of this input on the join node.
    pub fn reference_name(self) -> &'static str {
        match self {
            JoinSide::Left => "left",
            JoinSide::Right => "right",
        }
    }
}

/// SQL join kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinType {
    #[default]
    Inner,
    Left,
    Right,
    Full,
}

impl JoinType {
    pub fn as_sql(self) -> &'static str {
        match self {
            JoinType::Inner => "inner",
            JoinType::Left => "left",
            JoinType::Right => "right",
            JoinType::Full => "full",
        }
    }
}

/// One output column of a join and where it came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnLineage {
    pub name: String,
    pub side: JoinSide,
    /// Expression relative to the `side` input, references unresolved.
    pub expression: Expression,
}

impl ColumnLineage {
    pub fn new(name: impl Into<String>, side: JoinSide, expression: Expression) -> Self {
        Self {
            name: name.into(),
            side,
            expression,
        }
    }

    /// `<expression> as "<name>"` with references bound to the side alias.
    pub fn to_select_item(&self) -> GraphResult<String> {
        let sql = self
            .expression
            .resolve_column_references(Some(self.side.alias()))
            .to_sql()?;
        Ok(format!("{} as {}", sql, quote_identifier(&self.name)))
    }
}

/// Column lineage of `model` if it is a join node.
pub fn join_lineage(model: &Model) -> Option<&[ColumnLineage]> {
    if model.reference(JoinSide::Left.reference_name()).is_none()
        || model.reference(JoinSide::Right.reference_name()).is_none()
    {
        return None;
    }
    model.property("columns")?.as_lineage()
}

/// Rewrite `expression`, built against `origin`, so that every column
/// reference points at the `"l"` or `"r"` input of a join over `left`
/// and `right`.
///
/// `origin` may be `left`, `right`, or a join node (possibly a join of
/// joins) whose lineage leads back to them. Composite sub-expressions
/// are parenthesized where they are substituted.
pub fn realias_expression(
    expression: &Expression,
    origin: &Model,
    left: &Model,
    right: &Model,
) -> GraphResult<Expression> {
    if origin.hash() == left.hash() {
        return Ok(expression.resolve_column_references(Some(JoinSide::Left.alias())));
    }
    if origin.hash() == right.hash() {
        return Ok(expression.resolve_column_references(Some(JoinSide::Right.alias())));
    }
    if expression.is_resolved() {
        return Ok(expression.clone());
    }

    let lineage = join_lineage(origin).ok_or_else(|| GraphError::UntraceableReference {
        column: expression.column_references()[0].to_string(),
    })?;

    let mut tokens = Vec::with_capacity(expression.len());
    for token in expression.tokens() {
        let ExpressionToken::ColumnReference(name) = token else {
            tokens.push(token.clone());
            continue;
        };

        let column = lineage
            .iter()
            .find(|c| c.name == *name)
            .ok_or_else(|| GraphError::UntraceableReference {
                column: name.clone(),
            })?;
        let side_model = origin
            .reference(column.side.reference_name())
            .ok_or_else(|| GraphError::UntraceableReference {
                column: name.clone(),
            })?;

        let traced = realias_expression(&column.expression, side_model, left, right)?;
        if traced.len() > 1 {
            tokens.push(ExpressionToken::Raw("(".to_string()));
            tokens.extend(traced.tokens().iter().cloned());
            tokens.push(ExpressionToken::Raw(")".to_string()));
        } else {
            tokens.extend(traced.tokens().iter().cloned());
        }
    }

    Ok(Expression::new(tokens))
}

/// Assembles a join node over two lineages.
///
/// ```ignore
/// let joined = JoinBuilder::new(&orders, &customers)
///     .how(JoinType::Left)
///     .on_equal(col("customer_id"), col("id"))?
///     .select_left("order_id", col("id"))
///     .select_right("customer", col("name"))
///     .build()?;
/// ```
#[derive(Debug, Clone)]
pub struct JoinBuilder {
    left: Model,
    right: Model,
    how: JoinType,
    columns: Vec<ColumnLineage>,
    conditions: Vec<Expression>,
    materialization: Materialization,
}

impl JoinBuilder {
    pub fn new(left: &Model, right: &Model) -> Self {
        Self {
            left: left.clone(),
            right: right.clone(),
            how: JoinType::default(),
            columns: Vec::new(),
            conditions: Vec::new(),
            materialization: Materialization::default(),
        }
    }

    pub fn how(mut self, how: JoinType) -> Self {
        self.how = how;
        self
    }

    pub fn materialization(mut self, materialization: Materialization) -> Self {
        self.materialization = materialization;
        self
    }

    /// Output column computed from the left input.
    pub fn select_left(mut self, name: impl Into<String>, expression: Expression) -> Self {
        self.columns
            .push(ColumnLineage::new(name, JoinSide::Left, expression));
        self
    }

    /// Output column computed from the right input.
    pub fn select_right(mut self, name: impl Into<String>, expression: Expression) -> Self {
        self.columns
            .push(ColumnLineage::new(name, JoinSide::Right, expression));
        self
    }

    /// Pass columns of one input through under their own names.
    pub fn select_all(mut self, side: JoinSide, names: &[&str]) -> Self {
        for name in names {
            self.columns
                .push(ColumnLineage::new(*name, side, Expression::column_reference(*name)));
        }
        self
    }

    /// Require `left_key = right_key`, each built against its own input.
    pub fn on_equal(self, left_key: Expression, right_key: Expression) -> GraphResult<Self> {
        let condition = Expression::construct(
            "{} = {}",
            &[
                left_key.resolve_column_references(Some(JoinSide::Left.alias())),
                right_key.resolve_column_references(Some(JoinSide::Right.alias())),
            ],
        )?;
        Ok(self.on_resolved(condition))
    }

    /// Require `condition`, built against `origin`, which must trace back
    /// to the two inputs.
    pub fn on(self, condition: &Expression, origin: &Model) -> GraphResult<Self> {
        let resolved = realias_expression(condition, origin, &self.left, &self.right)?;
        Ok(self.on_resolved(resolved))
    }

    fn on_resolved(mut self, condition: Expression) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Instantiate the join node.
    pub fn build(self) -> GraphResult<Model> {
        if self.columns.is_empty() {
            return Err(GraphError::spec_mismatch(JOIN_NAME, "join selects no columns"));
        }
        for (i, column) in self.columns.iter().enumerate() {
            if self.columns[..i].iter().any(|c| c.name == column.name) {
                return Err(GraphError::spec_mismatch(
                    JOIN_NAME,
                    format!("duplicate output column '{}'", column.name),
                ));
            }
        }

        let condition = match self.conditions.len() {
            0 => Expression::raw("true"),
            1 => self.conditions[0].clone(),
            _ => {
                let mut tokens = Vec::new();
                for (i, c) in self.conditions.iter().enumerate() {
                    if i > 0 {
                        tokens.push(ExpressionToken::Raw(" and ".to_string()));
                    }
                    tokens.push(ExpressionToken::Raw("(".to_string()));
                    tokens.extend(c.tokens().iter().cloned());
                    tokens.push(ExpressionToken::Raw(")".to_string()));
                }
                Expression::new(tokens)
            }
        };

        let mut builder = ModelBuilder::new(TemplateSpec::new(JOIN_NAME, JOIN_TEMPLATE))?;
        builder
            .set(JoinSide::Left.reference_name(), self.left)?
            .set(JoinSide::Right.reference_name(), self.right)?
            .set("how", self.how.as_sql())?
            .set("columns", PropertyValue::Lineage(self.columns))?
            .set("condition", condition)?
            .set_materialization(self.materialization, None);
        builder.instantiate()
    }
}
