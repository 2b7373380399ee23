//! Model builders.
//!
//! A [`ModelBuilder`] accumulates reference and property values for one
//! spec and instantiates immutable [`Model`] nodes from them. References
//! may point at other builders; those are instantiated depth-first when
//! the parent is instantiated.
//!
//! ```ignore
//! let mut src = ModelBuilder::new(TemplateSpec::new("src", "select 1 as v"))?;
//! let src = src.instantiate()?;
//!
//! let mut doubled = ModelBuilder::new(TemplateSpec::new("double", "select v*2 as v from {{a}}"))?;
//! doubled.set("a", src)?;
//! let node = doubled.instantiate()?;
//! ```

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::rc::Rc;

use super::materialization::Materialization;
use super::node::Model;
use super::property::PropertyValue;
use super::spec::{validate_spec, ModelSpec, SpecRef};
use super::template::derive_references;
use crate::error::{GraphError, GraphResult};
use crate::sql::expr::Expression;

/// A builder shared between several parents.
///
/// Builders hold strong handles to the builders they reference. Builders
/// that reference each other in a loop keep each other alive until one of
/// the looping references is rebound, typically after
/// [`instantiate_recursively`] reports the [`GraphError::CycleError`].
pub type SharedBuilder = Rc<RefCell<ModelBuilder>>;

/// Value bound to a reference name.
#[derive(Debug, Clone)]
pub enum ReferenceValue {
    Model(Model),
    /// Instantiated together with the parent.
    Builder(SharedBuilder),
}

/// Anything that can be passed to [`ModelBuilder::set`].
#[derive(Debug, Clone)]
pub enum Value {
    Model(Model),
    Builder(SharedBuilder),
    Property(PropertyValue),
}

impl From<Model> for Value {
    fn from(m: Model) -> Self {
        Value::Model(m)
    }
}

impl From<&Model> for Value {
    fn from(m: &Model) -> Self {
        Value::Model(m.clone())
    }
}

impl From<SharedBuilder> for Value {
    fn from(b: SharedBuilder) -> Self {
        Value::Builder(b)
    }
}

impl From<&SharedBuilder> for Value {
    fn from(b: &SharedBuilder) -> Self {
        Value::Builder(b.clone())
    }
}

impl From<PropertyValue> for Value {
    fn from(p: PropertyValue) -> Self {
        Value::Property(p)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Property(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Property(s.into())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Property(n.into())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Property(b.into())
    }
}

impl From<Expression> for Value {
    fn from(e: Expression) -> Self {
        Value::Property(e.into())
    }
}

/// Lifecycle of a builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuilderState {
    /// Nothing set yet.
    Empty,
    /// Some required names still unset.
    Partial,
    /// Every required name set.
    Complete,
    /// Complete and instantiated with the current values.
    Instantiated,
}

/// A checked name binding, ready to store.
enum Binding {
    Reference(String, ReferenceValue),
    Property(String, PropertyValue),
}

/// Instance cache key: identical content emitted the same way.
type InstanceKey = (String, Materialization, Option<String>);

/// Mutable accumulator producing [`Model`] nodes for one spec.
#[derive(Debug)]
pub struct ModelBuilder {
    spec: SpecRef,
    /// Template references, required at instantiation.
    required_references: Vec<String>,
    declared_references: BTreeSet<String>,
    declared_properties: BTreeSet<String>,
    references: BTreeMap<String, ReferenceValue>,
    properties: BTreeMap<String, PropertyValue>,
    materialization: Materialization,
    materialization_name: Option<String>,
    instances: HashMap<InstanceKey, Model>,
    instantiated: bool,
}

impl ModelBuilder {
    /// Create a builder for `spec`.
    ///
    /// Fails if the spec's declared names disagree with its template.
    pub fn new(spec: impl ModelSpec + 'static) -> GraphResult<Self> {
        Self::from_spec(Rc::new(spec))
    }

    /// Create a builder for an already shared spec.
    pub fn from_spec(spec: SpecRef) -> GraphResult<Self> {
        validate_spec(spec.as_ref())?;
        Ok(Self {
            required_references: derive_references(spec.sql()),
            declared_references: spec.spec_references(),
            declared_properties: spec.spec_properties(),
            spec,
            references: BTreeMap::new(),
            properties: BTreeMap::new(),
            materialization: Materialization::default(),
            materialization_name: None,
            instances: HashMap::new(),
            instantiated: false,
        })
    }

    /// Wrap this builder so other builders can reference it.
    pub fn shared(self) -> SharedBuilder {
        Rc::new(RefCell::new(self))
    }

    pub fn generic_name(&self) -> &str {
        self.spec.generic_name()
    }

    pub fn spec(&self) -> &SpecRef {
        &self.spec
    }

    /// Bind one name.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> GraphResult<&mut Self> {
        let binding = self.classify(name.into(), value.into())?;
        self.apply(binding);
        Ok(self)
    }

    /// Bind several names at once.
    ///
    /// Every name is checked before any is stored, so a failed call
    /// leaves the builder unchanged.
    pub fn set_values<I, K, V>(&mut self, values: I) -> GraphResult<&mut Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let bindings = values
            .into_iter()
            .map(|(name, value)| self.classify(name.into(), value.into()))
            .collect::<GraphResult<Vec<_>>>()?;
        for binding in bindings {
            self.apply(binding);
        }
        Ok(self)
    }

    /// Check `name` against the declared names and the kind of `value`.
    fn classify(&self, name: String, value: Value) -> GraphResult<Binding> {
        if self.declared_references.contains(&name) {
            match value {
                Value::Model(m) => Ok(Binding::Reference(name, ReferenceValue::Model(m))),
                Value::Builder(b) => Ok(Binding::Reference(name, ReferenceValue::Builder(b))),
                Value::Property(_) => Err(GraphError::ReferenceTypeError {
                    model: self.generic_name().to_string(),
                    name,
                }),
            }
        } else if self.declared_properties.contains(&name) {
            match value {
                Value::Property(p) => Ok(Binding::Property(name, p)),
                Value::Model(_) | Value::Builder(_) => Err(GraphError::PropertyTypeError {
                    model: self.generic_name().to_string(),
                    name,
                }),
            }
        } else {
            Err(GraphError::spec_mismatch(
                self.generic_name(),
                format!("'{}' is neither a declared reference nor a property", name),
            ))
        }
    }

    fn apply(&mut self, binding: Binding) {
        match binding {
            Binding::Reference(name, value) => {
                self.references.insert(name, value);
            }
            Binding::Property(name, value) => {
                self.properties.insert(name, value);
            }
        }
        self.instantiated = false;
    }

    /// Choose how instantiated nodes are emitted.
    pub fn set_materialization(
        &mut self,
        materialization: Materialization,
        name: Option<String>,
    ) -> &mut Self {
        self.materialization = materialization;
        self.materialization_name = name;
        self.instantiated = false;
        self
    }

    /// Required names that are still unset.
    pub fn missing(&self) -> Vec<String> {
        let refs = self
            .required_references
            .iter()
            .filter(|r| !self.references.contains_key(*r));
        let props = self
            .declared_properties
            .iter()
            .filter(|p| !self.properties.contains_key(*p));
        refs.chain(props).cloned().collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing().is_empty()
    }

    pub fn state(&self) -> BuilderState {
        if self.references.is_empty() && self.properties.is_empty() && !self.is_complete() {
            BuilderState::Empty
        } else if !self.is_complete() {
            BuilderState::Partial
        } else if self.instantiated {
            BuilderState::Instantiated
        } else {
            BuilderState::Complete
        }
    }

    /// Instantiate a node from the current values.
    ///
    /// Builder-valued references are instantiated first. Repeating the
    /// call with unchanged values returns the same node.
    pub fn instantiate(&mut self) -> GraphResult<Model> {
        let mut stack = Vec::new();
        self.instantiate_with(&mut stack)
    }

    fn instantiate_with(&mut self, stack: &mut Vec<(*const (), String)>) -> GraphResult<Model> {
        let missing = self.missing();
        if !missing.is_empty() {
            return Err(GraphError::spec_mismatch(
                self.generic_name(),
                format!("cannot instantiate, unset: {}", missing.join(", ")),
            ));
        }

        let mut references = BTreeMap::new();
        for (name, value) in &self.references {
            let model = match value {
                ReferenceValue::Model(m) => m.clone(),
                ReferenceValue::Builder(b) => instantiate_shared(b, stack)?,
            };
            references.insert(name.clone(), model);
        }

        let model = Model::from_parts(
            self.spec.clone(),
            references,
            self.properties.clone(),
            self.materialization,
            self.materialization_name.clone(),
        )?;

        let key = (
            model.hash().to_string(),
            self.materialization,
            self.materialization_name.clone(),
        );
        self.instantiated = true;

        if let Some(cached) = self.instances.get(&key) {
            // Nodes can be re-materialized in place after they leave the cache.
            if cached.materialization() == key.1 && cached.materialization_name() == key.2 {
                log::debug!(
                    "builder cache hit for {} ({})",
                    self.generic_name(),
                    cached.hash()
                );
                return Ok(cached.clone());
            }
            log::debug!(
                "evicting re-materialized {} ({})",
                self.generic_name(),
                cached.hash()
            );
        }

        log::debug!("instantiated {} ({})", self.generic_name(), model.hash());
        self.instances.insert(key, model.clone());
        Ok(model)
    }
}

/// Instantiate a shared builder, resolving builder references depth-first.
///
/// Fails with [`GraphError::CycleError`] when the builder graph loops.
pub fn instantiate_recursively(builder: &SharedBuilder) -> GraphResult<Model> {
    let mut stack = Vec::new();
    instantiate_shared(builder, &mut stack)
}

fn instantiate_shared(
    builder: &SharedBuilder,
    stack: &mut Vec<(*const (), String)>,
) -> GraphResult<Model> {
    let ptr = Rc::as_ptr(builder) as *const ();

    if let Some(pos) = stack.iter().position(|(p, _)| *p == ptr) {
        let mut chain: Vec<String> = stack[pos..].iter().map(|(_, n)| n.clone()).collect();
        chain.push(stack[pos].1.clone());
        return Err(GraphError::CycleError(chain));
    }

    // A builder already borrowed further up is part of a loop through an
    // owned (unshared) root.
    let mut guard = builder.try_borrow_mut().map_err(|_| {
        let mut chain: Vec<String> = stack.iter().map(|(_, n)| n.clone()).collect();
        chain.push("<root>".to_string());
        GraphError::CycleError(chain)
    })?;

    stack.push((ptr, guard.generic_name().to_string()));
    let result = guard.instantiate_with(stack);
    stack.pop();
    result
}
