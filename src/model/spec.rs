//! Model specs: the template and declared names behind a family of nodes.
//!
//! A spec is shared by every node built from it. Implementors provide
//! the SQL template and the names it declares; [`validate_spec`] checks
//! the declaration against the template when a builder is created.

use std::collections::BTreeSet;
use std::fmt;
use std::rc::Rc;

use super::property::{format_value, PropertyValue};
use super::template::{derive_properties, derive_references, ID_PLACEHOLDER};
use crate::error::{GraphError, GraphResult};

/// Capability interface for anything that can back a [`Model`](super::Model).
pub trait ModelSpec: fmt::Debug {
    /// Display label, used as the prefix of generated names.
    fn generic_name(&self) -> &str;

    /// The SQL template.
    fn sql(&self) -> &str;

    /// Every reference name a node of this spec may carry.
    ///
    /// Must contain all `{{name}}` placeholders of the template and may
    /// declare extra bookkeeping edges that the template never uses.
    fn spec_references(&self) -> BTreeSet<String>;

    /// Every property name; must equal the `{name}` placeholders.
    fn spec_properties(&self) -> BTreeSet<String>;

    /// Render a property value into template text.
    fn format_property(&self, _name: &str, value: &PropertyValue) -> GraphResult<String> {
        format_value(value)
    }
}

/// Shared handle to a spec.
pub type SpecRef = Rc<dyn ModelSpec>;

/// Check a spec's declared names against its template.
pub fn validate_spec(spec: &dyn ModelSpec) -> GraphResult<()> {
    let name = spec.generic_name();
    let declared_refs = spec.spec_references();
    let declared_props = spec.spec_properties();
    let template_props: BTreeSet<String> = derive_properties(spec.sql()).into_iter().collect();

    if declared_refs.contains(ID_PLACEHOLDER) || declared_props.contains(ID_PLACEHOLDER) {
        return Err(GraphError::spec_mismatch(
            name,
            "'id' is reserved and cannot be declared",
        ));
    }

    for r in derive_references(spec.sql()) {
        if !declared_refs.contains(&r) {
            return Err(GraphError::spec_mismatch(
                name,
                format!("template reference '{}' is not declared", r),
            ));
        }
    }

    if declared_props != template_props {
        let missing: Vec<_> = template_props.difference(&declared_props).cloned().collect();
        let extra: Vec<_> = declared_props.difference(&template_props).cloned().collect();
        return Err(GraphError::spec_mismatch(
            name,
            format!(
                "declared properties differ from template (undeclared: [{}], unused: [{}])",
                missing.join(", "),
                extra.join(", ")
            ),
        ));
    }

    if let Some(both) = declared_refs.intersection(&declared_props).next() {
        return Err(GraphError::spec_mismatch(
            name,
            format!("'{}' is declared as both reference and property", both),
        ));
    }

    Ok(())
}

/// Spec whose names are derived straight from its template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSpec {
    generic_name: String,
    sql: String,
    extra_references: BTreeSet<String>,
}

impl TemplateSpec {
    pub fn new(generic_name: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            generic_name: generic_name.into(),
            sql: sql.into(),
            extra_references: BTreeSet::new(),
        }
    }

    /// Declare a reference the template does not use.
    pub fn with_extra_reference(mut self, name: impl Into<String>) -> Self {
        self.extra_references.insert(name.into());
        self
    }
}

impl ModelSpec for TemplateSpec {
    fn generic_name(&self) -> &str {
        &self.generic_name
    }

    fn sql(&self) -> &str {
        &self.sql
    }

    fn spec_references(&self) -> BTreeSet<String> {
        derive_references(&self.sql)
            .into_iter()
            .chain(self.extra_references.iter().cloned())
            .collect()
    }

    fn spec_properties(&self) -> BTreeSet<String> {
        derive_properties(&self.sql).into_iter().collect()
    }
}
