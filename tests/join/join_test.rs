//! Integration tests for joins and column re-aliasing.

use sqlgraph::compile::compile_one;
use sqlgraph::error::GraphError;
use sqlgraph::join::{realias_expression, JoinBuilder, JoinSide, JoinType};
use sqlgraph::model::{Materialization, Model, ModelBuilder, TemplateSpec};
use sqlgraph::sql::{col, Expression};

fn source(name: &str, columns: &str) -> Model {
    let mut b =
        ModelBuilder::new(TemplateSpec::new(name, format!("select {} from {}", columns, name)))
            .unwrap();
    b.instantiate().unwrap()
}

fn join(left: &Model, right: &Model, left_cols: &[&str], right_cols: &[&str]) -> Model {
    JoinBuilder::new(left, right)
        .on_equal(col("k"), col("k"))
        .unwrap()
        .select_all(JoinSide::Left, left_cols)
        .select_all(JoinSide::Right, right_cols)
        .build()
        .unwrap()
}

/// j3 = join(j1, j2), j1 = join(a, b), j2 = join(c, d)
struct Nested {
    a: Model,
    d: Model,
    j1: Model,
    j2: Model,
    j3: Model,
}

fn nested() -> Nested {
    let a = source("a", "k, a");
    let b = source("b", "k, b");
    let c = source("c", "k, c");
    let d = source("d", "k, d");
    let j1 = join(&a, &b, &["k", "a"], &["b"]);
    let j2 = join(&c, &d, &["k", "c"], &["d"]);
    let j3 = join(&j1, &j2, &["k", "a", "b"], &["c", "d"]);
    Nested { a, d, j1, j2, j3 }
}

fn four_way() -> Expression {
    Expression::construct(
        "{} = {} and {} = {}",
        &[col("a"), col("b"), col("c"), col("d")],
    )
    .unwrap()
}

#[test]
fn test_realias_nested_join_onto_outer_inputs() {
    let n = nested();
    let out = realias_expression(&four_way(), &n.j3, &n.j1, &n.j2).unwrap();
    assert_eq!(
        out.to_sql().unwrap(),
        "\"l\".\"a\" = \"l\".\"b\" and \"r\".\"c\" = \"r\".\"d\""
    );
}

#[test]
fn test_realias_traces_through_two_levels() {
    let n = nested();
    let expr = Expression::construct("{} < {}", &[col("a"), col("d")]).unwrap();
    let out = realias_expression(&expr, &n.j3, &n.a, &n.d).unwrap();
    assert_eq!(out.to_sql().unwrap(), "\"l\".\"a\" < \"r\".\"d\"");
}

#[test]
fn test_realias_column_from_neither_input() {
    let n = nested();
    // `b` lives in j1's right input, which is neither `a` nor `d`.
    let err = realias_expression(&four_way(), &n.j3, &n.a, &n.d).unwrap_err();
    assert!(matches!(err, GraphError::UntraceableReference { column } if column == "b"));

    let err = realias_expression(&col("missing"), &n.j3, &n.j1, &n.j2).unwrap_err();
    assert!(matches!(err, GraphError::UntraceableReference { column } if column == "missing"));
}

#[test]
fn test_join_on_condition_from_earlier_join() {
    let n = nested();
    let outer = JoinBuilder::new(&n.a, &n.d)
        .how(JoinType::Full)
        .on(&Expression::construct("{} = {}", &[col("a"), col("d")]).unwrap(), &n.j3)
        .unwrap()
        .select_left("a", col("a"))
        .select_right("d", col("d"))
        .materialization(Materialization::Query)
        .build()
        .unwrap();

    let sql = compile_one(&outer).unwrap();
    assert!(sql.contains(" as \"l\" full join "));
    assert!(sql.ends_with(" as \"r\" on \"l\".\"a\" = \"r\".\"d\""));
}

#[test]
fn test_nested_join_compiles_with_shared_ctes() {
    let n = nested();
    let top = n.j3.copy_set_materialization(Materialization::Query, None);
    let sql = compile_one(&top).unwrap();

    // Four sources plus the two inner joins, each once.
    assert_eq!(sql.matches(" as (").count(), 6);
    assert!(sql.starts_with("with \"a___"));
    assert!(sql.contains("select \"l\".\"k\" as \"k\", \"l\".\"a\" as \"a\", \"l\".\"b\" as \"b\", \"r\".\"c\" as \"c\", \"r\".\"d\" as \"d\" from "));
}
