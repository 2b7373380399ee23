//! The graph node.
//!
//! A [`Model`] is a cheap, clonable handle to an immutable node. Nodes
//! are shared by any number of parents; the only state that may change
//! after construction is the materialization tag, which is not part of
//! the node's identity.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use super::hash::ModelDigest;
use super::materialization::Materialization;
use super::property::PropertyValue;
use super::spec::SpecRef;
use crate::error::{GraphError, GraphResult};

struct ModelData {
    spec: SpecRef,
    references: BTreeMap<String, Model>,
    properties: BTreeMap<String, PropertyValue>,
    materialization: Cell<Materialization>,
    materialization_name: RefCell<Option<String>>,
    hash: String,
}

/// Shared handle to an immutable SQL model node.
#[derive(Clone)]
pub struct Model {
    inner: Rc<ModelData>,
}

impl Model {
    /// Assemble a node and compute its hash.
    ///
    /// Callers are responsible for completeness; builders and the
    /// `copy_*` methods check names before getting here.
    pub(crate) fn from_parts(
        spec: SpecRef,
        references: BTreeMap<String, Model>,
        properties: BTreeMap<String, PropertyValue>,
        materialization: Materialization,
        materialization_name: Option<String>,
    ) -> GraphResult<Self> {
        let mut formatted = BTreeMap::new();
        for (name, value) in &properties {
            formatted.insert(name.as_str(), spec.format_property(name, value)?);
        }

        let hash = ModelDigest {
            generic_name: spec.generic_name(),
            template: spec.sql(),
            properties: formatted,
            references: references
                .iter()
                .map(|(name, m)| (name.as_str(), m.hash()))
                .collect(),
        }
        .hash()?;

        Ok(Self {
            inner: Rc::new(ModelData {
                spec,
                references,
                properties,
                materialization: Cell::new(materialization),
                materialization_name: RefCell::new(materialization_name),
                hash,
            }),
        })
    }

    pub fn spec(&self) -> &SpecRef {
        &self.inner.spec
    }

    pub fn generic_name(&self) -> &str {
        self.inner.spec.generic_name()
    }

    pub fn sql_template(&self) -> &str {
        self.inner.spec.sql()
    }

    /// 32 lowercase hex characters identifying this node's content.
    pub fn hash(&self) -> &str {
        &self.inner.hash
    }

    /// Read-only view of the references.
    pub fn references(&self) -> &BTreeMap<String, Model> {
        &self.inner.references
    }

    pub fn reference(&self, name: &str) -> Option<&Model> {
        self.inner.references.get(name)
    }

    /// Read-only view of the properties.
    pub fn properties(&self) -> &BTreeMap<String, PropertyValue> {
        &self.inner.properties
    }

    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.inner.properties.get(name)
    }

    pub fn materialization(&self) -> Materialization {
        self.inner.materialization.get()
    }

    pub fn materialization_name(&self) -> Option<String> {
        self.inner.materialization_name.borrow().clone()
    }

    /// Change how this node is emitted, in place.
    ///
    /// Every parent sharing this node sees the change. The hash is
    /// unaffected.
    pub fn set_materialization(&self, materialization: Materialization, name: Option<String>) {
        self.inner.materialization.set(materialization);
        *self.inner.materialization_name.borrow_mut() = name;
    }

    /// Same node object?
    pub fn ptr_eq(a: &Model, b: &Model) -> bool {
        Rc::ptr_eq(&a.inner, &b.inner)
    }

    /// Address of the shared node, stable while any handle is alive.
    pub(crate) fn node_id(&self) -> usize {
        Rc::as_ptr(&self.inner) as usize
    }

    /// New node with some properties replaced; everything else is shared.
    pub fn copy_set<I, K, V>(&self, new_properties: I) -> GraphResult<Model>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<PropertyValue>,
    {
        let declared = self.inner.spec.spec_properties();
        let mut properties = self.inner.properties.clone();
        for (name, value) in new_properties {
            let name = name.into();
            if !declared.contains(&name) {
                return Err(GraphError::spec_mismatch(
                    self.generic_name(),
                    format!("'{}' is not a declared property", name),
                ));
            }
            properties.insert(name, value.into());
        }

        Model::from_parts(
            self.inner.spec.clone(),
            self.inner.references.clone(),
            properties,
            self.materialization(),
            self.materialization_name(),
        )
    }

    /// New node with some references swapped; everything else is shared.
    pub fn copy_link<I, K>(&self, new_references: I) -> GraphResult<Model>
    where
        I: IntoIterator<Item = (K, Model)>,
        K: Into<String>,
    {
        let declared = self.inner.spec.spec_references();
        let mut references = self.inner.references.clone();
        for (name, model) in new_references {
            let name = name.into();
            if !declared.contains(&name) {
                return Err(GraphError::spec_mismatch(
                    self.generic_name(),
                    format!("'{}' is not a declared reference", name),
                ));
            }
            references.insert(name, model);
        }

        Model::from_parts(
            self.inner.spec.clone(),
            references,
            self.inner.properties.clone(),
            self.materialization(),
            self.materialization_name(),
        )
    }

    /// New node identical to this one except for its materialization.
    ///
    /// The hash is copied rather than recomputed; it does not depend on
    /// materialization.
    pub fn copy_set_materialization(
        &self,
        materialization: Materialization,
        name: Option<String>,
    ) -> Model {
        Model {
            inner: Rc::new(ModelData {
                spec: self.inner.spec.clone(),
                references: self.inner.references.clone(),
                properties: self.inner.properties.clone(),
                materialization: Cell::new(materialization),
                materialization_name: RefCell::new(name),
                hash: self.inner.hash.clone(),
            }),
        }
    }
}

impl PartialEq for Model {
    /// Equal content and equal materialization.
    fn eq(&self, other: &Self) -> bool {
        Model::ptr_eq(self, other)
            || (self.hash() == other.hash()
                && self.materialization() == other.materialization()
                && self.materialization_name() == other.materialization_name())
    }
}

impl Eq for Model {}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("generic_name", &self.generic_name())
            .field("hash", &self.hash())
            .field("materialization", &self.materialization())
            .field("references", &self.inner.references.keys().collect::<Vec<_>>())
            .finish()
    }
}
