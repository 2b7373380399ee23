//! Integration tests for single-statement compilation.

use sqlgraph::compile::{compile_one, Compiler};
use sqlgraph::config::{init_logging, CompilerSettings, LoggingSettings};
use sqlgraph::error::GraphError;
use sqlgraph::model::{Materialization, Model, ModelBuilder, TemplateSpec};

// ============================================================================
// Helpers
// ============================================================================

fn node(name: &str, sql: &str, refs: &[(&str, &Model)], mat: Materialization) -> Model {
    let mut b = ModelBuilder::new(TemplateSpec::new(name, sql)).unwrap();
    for (r, m) in refs {
        b.set(*r, *m).unwrap();
    }
    b.set_materialization(mat, None);
    b.instantiate().unwrap()
}

/// A <- B <- C, with C referencing the same B twice.
fn abc() -> (Model, Model, Model) {
    init_logging(&LoggingSettings::default());

    let a = node("a", "select 1 as v", &[], Materialization::Cte);
    let b = node(
        "b",
        "select v*2 as v from {{a}}",
        &[("a", &a)],
        Materialization::Cte,
    );
    let c = node(
        "c",
        "select x.v+y.v as v from {{x}} x, {{y}} y",
        &[("x", &b), ("y", &b)],
        Materialization::Query,
    );
    (a, b, c)
}

// ============================================================================
// CTE Flattening
// ============================================================================

#[test]
fn test_shared_cte_emitted_once() {
    let (a, b, c) = abc();
    let compiler = Compiler::default();
    let a_name = compiler.model_name(&a);
    let b_name = compiler.model_name(&b);

    let sql = compile_one(&c).unwrap();

    assert_eq!(
        sql,
        format!(
            "with {a} as (select 1 as v), {b} as (select v*2 as v from {a}) \
             select x.v+y.v as v from {b} x, {b} y",
            a = a_name,
            b = b_name
        )
    );
    assert_eq!(sql.matches(&format!("{} as (", b_name)).count(), 1);
}

#[test]
fn test_cte_shared_directly_and_indirectly_emitted_once() {
    let (_, b, _) = abc();
    let d = node("d", "select v from {{b}}", &[("b", &b)], Materialization::Cte);
    let root = node(
        "root",
        "select * from {{b}}, {{d}}",
        &[("b", &b), ("d", &d)],
        Materialization::Query,
    );

    let sql = compile_one(&root).unwrap();
    let b_name = Compiler::default().model_name(&b);
    assert_eq!(sql.matches(&format!("{} as (", b_name)).count(), 1);
    assert_eq!(sql.matches(" as (").count(), 3);
}

#[test]
fn test_shared_cte_snapshot() {
    let (_, _, c) = abc();
    let sql = compile_one(&c).unwrap();

    insta::with_settings!({filters => vec![(r"___[0-9a-f]{32}", "___<hash>")]}, {
        insta::assert_snapshot!(sql, @r#"with "a___<hash>" as (select 1 as v), "b___<hash>" as (select v*2 as v from "a___<hash>") select x.v+y.v as v from "b___<hash>" x, "b___<hash>" y"#);
    });
}

#[test]
fn test_pretty_layout() {
    let (_, _, c) = abc();
    let compiler = Compiler::new(CompilerSettings {
        pretty: true,
        ..CompilerSettings::default()
    });
    let sql = compiler.compile_one(&c).unwrap();
    let lines: Vec<&str> = sql.lines().collect();

    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("with \"a___"));
    assert!(lines[1].starts_with("\"b___"));
    assert!(lines[2].starts_with("select x.v+y.v"));
}

#[test]
fn test_statement_children_are_referenced_not_inlined() {
    let t = node("t", "select 1 as v", &[], Materialization::Table);
    let q = node("q", "select v from {{t}}", &[("t", &t)], Materialization::Query);

    let sql = compile_one(&q).unwrap();
    assert_eq!(
        sql,
        format!("select v from {}", Compiler::default().model_name(&t))
    );
}

#[test]
fn test_compilation_is_deterministic() {
    let (_, _, first) = abc();
    let (_, _, second) = abc();

    assert!(!Model::ptr_eq(&first, &second));
    assert_eq!(first.hash(), second.hash());
    assert_eq!(compile_one(&first).unwrap(), compile_one(&second).unwrap());
}

#[test]
fn test_custom_name_settings() {
    let a = node("orders_by_customer", "select 1 as v", &[], Materialization::View);
    let compiler = Compiler::new(CompilerSettings {
        name_prefix_length: 6,
        name_separator: "_".to_string(),
        pretty: false,
    });

    let sql = compiler.compile_one(&a).unwrap();
    assert_eq!(
        sql,
        format!("create view \"orders_{}\" as select 1 as v", a.hash())
    );
}

// ============================================================================
// Templates With Their Own CTEs
// ============================================================================

#[test]
fn test_template_ctes_are_merged_into_one_clause() {
    let a = node("a", "select 1 as v", &[], Materialization::Cte);
    let b = node(
        "b",
        "with doubled as (select v*2 as v from {{a}}) select v from doubled",
        &[("a", &a)],
        Materialization::Query,
    );

    let a_name = Compiler::default().model_name(&a);
    assert_eq!(
        compile_one(&b).unwrap(),
        format!(
            "with {a} as (select 1 as v), doubled as (select v*2 as v from {a}) select v from doubled",
            a = a_name
        )
    );
}

#[test]
fn test_mixed_case_template_cte_keeps_spelling() {
    let a = node(
        "a",
        "with Doubled as (select 1 as v) select v from Doubled",
        &[],
        Materialization::Query,
    );
    assert_eq!(
        compile_one(&a).unwrap(),
        "with Doubled as (select 1 as v) select v from Doubled"
    );
}

#[test]
fn test_same_relation_spelled_differently_is_deduplicated() {
    let p = node(
        "p",
        "with shared as (select 1 as v) select v from shared",
        &[],
        Materialization::Cte,
    );
    let q = node(
        "q",
        "with \"shared\" as (select 1 as v) select v from \"shared\"",
        &[],
        Materialization::Cte,
    );
    let root = node(
        "root",
        "select * from {{p}}, {{q}}",
        &[("p", &p), ("q", &q)],
        Materialization::Query,
    );

    let sql = compile_one(&root).unwrap();
    assert_eq!(sql.matches(" as (select 1 as v)").count(), 1);
    assert!(sql.starts_with("with shared as (select 1 as v), "));
}

#[test]
fn test_id_placeholder_is_the_hash() {
    let a = node("a", "select '{{id}}' as node_id", &[], Materialization::Query);
    assert_eq!(
        compile_one(&a).unwrap(),
        format!("select '{}' as node_id", a.hash())
    );
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_name_conflict() {
    let p = node(
        "p",
        "with shared as (select 1 as v) select v from shared",
        &[],
        Materialization::Cte,
    );
    let q = node(
        "q",
        "with shared as (select 2 as v) select v from shared",
        &[],
        Materialization::Cte,
    );
    let root = node(
        "root",
        "select * from {{p}}, {{q}}",
        &[("p", &p), ("q", &q)],
        Materialization::Query,
    );

    let err = compile_one(&root).unwrap_err();
    assert!(matches!(err, GraphError::NameConflict { name } if name == "shared"));
}

#[test]
fn test_hash_ambiguity() {
    let cte = node("a", "select 1 as v", &[], Materialization::Cte);
    let table = cte.copy_set_materialization(Materialization::Table, None);
    assert_eq!(cte.hash(), table.hash());

    let root = node(
        "root",
        "select * from {{x}}, {{y}}",
        &[("x", &cte), ("y", &table)],
        Materialization::Query,
    );

    let err = compile_one(&root).unwrap_err();
    assert!(matches!(err, GraphError::HashAmbiguity { hash, .. } if hash == cte.hash()));
}

#[test]
fn test_malformed_own_with_clause() {
    let a = node("a", "with broken as (select 1", &[], Materialization::Query);
    assert!(matches!(
        compile_one(&a),
        Err(GraphError::MalformedTemplate { model, .. }) if model == "a"
    ));
}
