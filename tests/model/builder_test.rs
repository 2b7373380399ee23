//! Integration tests for building model nodes.

use std::collections::BTreeSet;

use sqlgraph::error::{GraphError, GraphResult};
use sqlgraph::model::{
    instantiate_recursively, BuilderState, Materialization, Model, ModelBuilder, ModelSpec,
    PropertyValue, TemplateSpec,
};
use sqlgraph::sql::{col, Expression};
use sqlgraph::compile::{compile_one, Compiler};

// ============================================================================
// Hand-written specs
// ============================================================================

/// Spec with a property rendered as a `limit` clause.
#[derive(Debug)]
struct TopN;

impl ModelSpec for TopN {
    fn generic_name(&self) -> &str {
        "top_n"
    }

    fn sql(&self) -> &str {
        "select * from {{source}} order by {order} {limit}"
    }

    fn spec_references(&self) -> BTreeSet<String> {
        ["source".to_string()].into_iter().collect()
    }

    fn spec_properties(&self) -> BTreeSet<String> {
        ["order".to_string(), "limit".to_string()].into_iter().collect()
    }

    fn format_property(&self, name: &str, value: &PropertyValue) -> GraphResult<String> {
        match (name, value) {
            ("limit", PropertyValue::Null) => Ok(String::new()),
            ("limit", PropertyValue::Int(n)) => Ok(format!("limit {}", n)),
            _ => sqlgraph::model::format_value(value),
        }
    }
}

/// Spec that forgets to declare one of its properties.
#[derive(Debug)]
struct Undeclared;

impl ModelSpec for Undeclared {
    fn generic_name(&self) -> &str {
        "undeclared"
    }

    fn sql(&self) -> &str {
        "select {a}, {b}"
    }

    fn spec_references(&self) -> BTreeSet<String> {
        BTreeSet::new()
    }

    fn spec_properties(&self) -> BTreeSet<String> {
        ["a".to_string()].into_iter().collect()
    }
}

fn source() -> Model {
    let mut b = ModelBuilder::new(TemplateSpec::new("src", "select 1 as v")).unwrap();
    b.instantiate().unwrap()
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn test_custom_property_formatting() {
    let src = source().copy_set_materialization(Materialization::Table, Some("src".into()));
    let mut b = ModelBuilder::new(TopN).unwrap();
    b.set("source", &src)
        .unwrap()
        .set("order", Expression::construct("{} desc", &[col("v")]).unwrap().resolve_column_references(None))
        .unwrap()
        .set("limit", 10i64)
        .unwrap()
        .set_materialization(Materialization::Query, None);
    let top = b.instantiate().unwrap();

    assert_eq!(
        compile_one(&top).unwrap(),
        "select * from \"src\" order by \"v\" desc limit 10"
    );
}

#[test]
fn test_undeclared_property_rejected_at_construction() {
    let err = ModelBuilder::new(Undeclared).unwrap_err();
    assert!(matches!(err, GraphError::SpecMismatch { model, .. } if model == "undeclared"));
}

#[test]
fn test_builder_lifecycle() {
    let mut b = ModelBuilder::new(TopN).unwrap();
    assert_eq!(b.state(), BuilderState::Empty);

    b.set("limit", PropertyValue::Null).unwrap();
    assert_eq!(b.state(), BuilderState::Partial);
    assert_eq!(b.missing(), vec!["source".to_string(), "order".to_string()]);
    assert!(matches!(b.instantiate(), Err(GraphError::SpecMismatch { .. })));

    b.set("source", source()).unwrap().set("order", "1").unwrap();
    assert_eq!(b.state(), BuilderState::Complete);

    let first = b.instantiate().unwrap();
    assert_eq!(b.state(), BuilderState::Instantiated);
    let second = b.instantiate().unwrap();
    assert!(Model::ptr_eq(&first, &second));
}

#[test]
fn test_value_kind_checks() {
    let mut b = ModelBuilder::new(TopN).unwrap();
    assert!(matches!(
        b.set("source", "not a model"),
        Err(GraphError::ReferenceTypeError { name, .. }) if name == "source"
    ));
    assert!(matches!(
        b.set("limit", source()),
        Err(GraphError::PropertyTypeError { name, .. }) if name == "limit"
    ));
    assert!(matches!(
        b.set("nope", 1i64),
        Err(GraphError::SpecMismatch { .. })
    ));
}

#[test]
fn test_builder_references_instantiate_depth_first() {
    let leaf = ModelBuilder::new(TemplateSpec::new("leaf", "select 1 as v"))
        .unwrap()
        .shared();
    let mid = ModelBuilder::new(TemplateSpec::new("mid", "select v from {{leaf}}"))
        .unwrap()
        .shared();
    mid.borrow_mut().set("leaf", &leaf).unwrap();

    let mut top = ModelBuilder::new(TemplateSpec::new("top", "select v from {{mid}}")).unwrap();
    top.set("mid", &mid).unwrap();
    let model = top.instantiate().unwrap();

    let leaf_model = model.reference("mid").unwrap().reference("leaf").unwrap();
    assert_eq!(leaf_model.generic_name(), "leaf");
    assert_eq!(leaf.borrow().state(), BuilderState::Instantiated);
}

#[test]
fn test_builder_cycle_detected() {
    let a = ModelBuilder::new(TemplateSpec::new("a", "select * from {{b}}"))
        .unwrap()
        .shared();
    let b = ModelBuilder::new(TemplateSpec::new("b", "select * from {{a}}"))
        .unwrap()
        .shared();
    a.borrow_mut().set("b", &b).unwrap();
    b.borrow_mut().set("a", &a).unwrap();

    let err = instantiate_recursively(&a).unwrap_err();
    match err {
        GraphError::CycleError(chain) => assert_eq!(chain, vec!["a", "b", "a"]),
        other => panic!("expected cycle error, got {other:?}"),
    }
}

#[test]
fn test_extra_reference_is_an_edge_and_inlined() {
    let audit = source();
    let mut b = ModelBuilder::new(
        TemplateSpec::new("tracked", "select 2 as v").with_extra_reference("audit"),
    )
    .unwrap();
    assert!(b.is_complete());
    b.set("audit", &audit).unwrap();
    let tracked = b.instantiate().unwrap();

    assert!(Model::ptr_eq(tracked.reference("audit").unwrap(), &audit));
    assert_eq!(
        compile_one(&tracked).unwrap(),
        format!(
            "with {} as (select 1 as v) select 2 as v",
            Compiler::default().model_name(&audit)
        )
    );
}
