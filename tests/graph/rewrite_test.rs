//! Integration tests for searching and rewriting model graphs.

use sqlgraph::compile::compile_one;
use sqlgraph::error::GraphError;
use sqlgraph::graph::{find_node, node_at_path, replace_node_in_graph, ReferencePath};
use sqlgraph::model::{Materialization, Model, ModelBuilder, TemplateSpec};

fn node(name: &str, sql: &str, refs: &[(&str, &Model)]) -> Model {
    let mut b = ModelBuilder::new(TemplateSpec::new(name, sql)).unwrap();
    for (r, m) in refs {
        b.set(*r, *m).unwrap();
    }
    b.instantiate().unwrap()
}

/// orders <- daily <- report
fn pipeline() -> Model {
    let orders = node("orders", "select * from raw_orders", &[]);
    let daily = node(
        "daily",
        "select day, count(*) as n from {{orders}} group by day",
        &[("orders", &orders)],
    );
    let report = node("report", "select * from {{daily}}", &[("daily", &daily)]);
    report.set_materialization(Materialization::Query, None);
    report
}

#[test]
fn test_swap_source_rewrites_sql_only_in_copy() {
    let report = pipeline();
    let before = compile_one(&report).unwrap();

    let (_, path) = find_node(&report, |m| m.generic_name() == "orders", false).unwrap();
    assert_eq!(path.to_string(), "daily/orders");

    let sample = node("orders", "select * from raw_orders tablesample system (1)", &[]);
    let rewritten = replace_node_in_graph(&report, &path, sample).unwrap();

    assert_eq!(compile_one(&report).unwrap(), before);
    let after = compile_one(&rewritten).unwrap();
    assert_ne!(after, before);
    assert!(after.contains("tablesample system (1)"));
    assert_eq!(rewritten.materialization(), Materialization::Query);
}

#[test]
fn test_materialize_intermediate_node() {
    let report = pipeline();
    let path: ReferencePath = ["daily"].into_iter().collect();
    let daily = node_at_path(&report, &path).unwrap();

    let table = daily.copy_set_materialization(Materialization::Table, Some("daily_counts".into()));
    let rewritten = replace_node_in_graph(&report, &path, table).unwrap();

    assert_eq!(rewritten.hash(), report.hash());
    assert_eq!(
        compile_one(&rewritten).unwrap(),
        "select * from \"daily_counts\""
    );
}

#[test]
fn test_missing_path_reports_path() {
    let report = pipeline();
    let path: ReferencePath = ["orders"].into_iter().collect();
    let replacement = node("x", "select 1", &[]);
    assert!(matches!(
        replace_node_in_graph(&report, &path, replacement),
        Err(GraphError::PathNotFound { path }) if path == "orders"
    ));
}
