//! Integration tests for content hashing.

use sqlgraph::model::{Materialization, Model, ModelBuilder, TemplateSpec};

fn leaf(sql: &str) -> Model {
    let mut b = ModelBuilder::new(TemplateSpec::new("leaf", sql)).unwrap();
    b.instantiate().unwrap()
}

fn filtered(source: &Model, threshold: i64) -> Model {
    let mut b =
        ModelBuilder::new(TemplateSpec::new("filtered", "select * from {{src}} where v > {min}"))
            .unwrap();
    b.set("src", source).unwrap().set("min", threshold).unwrap();
    b.instantiate().unwrap()
}

#[test]
fn test_hash_shape() {
    let h = leaf("select 1 as v").hash().to_string();
    assert_eq!(h.len(), 32);
    assert!(h.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
}

#[test]
fn test_hash_ignores_materialization() {
    let a = leaf("select 1 as v");
    for m in [
        Materialization::Query,
        Materialization::View,
        Materialization::Table,
        Materialization::TempTable,
        Materialization::Virtual,
    ] {
        assert_eq!(a.copy_set_materialization(m, Some("n".into())).hash(), a.hash());
    }
}

#[test]
fn test_hash_tracks_content() {
    let a = leaf("select 1 as v");
    let b = leaf("select 2 as v");
    assert_ne!(a.hash(), b.hash());

    assert_eq!(filtered(&a, 1).hash(), filtered(&a, 1).hash());
    assert_ne!(filtered(&a, 1).hash(), filtered(&a, 2).hash());
    assert_ne!(filtered(&a, 1).hash(), filtered(&b, 1).hash());
}

#[test]
fn test_hash_changes_propagate_to_ancestors() {
    let a = leaf("select 1 as v");
    let f = filtered(&a, 1);
    let relinked = f.copy_link([("src", leaf("select 3 as v"))]).unwrap();
    assert_ne!(relinked.hash(), f.hash());

    let same = f.copy_link([("src", leaf("select 1 as v"))]).unwrap();
    assert_eq!(same.hash(), f.hash());
}
