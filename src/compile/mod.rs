//! Compilation of model graphs to SQL text.
//!
//! ```text
//! Model graph → CTE flattening → with-clause assembly → materialization wrapper → SQL
//! ```
//!
//! # Example
//!
//! ```ignore
//! use sqlgraph::compile::{compile_one, compile_reachable};
//!
//! let sql = compile_one(&model)?;
//! for statement in compile_reachable(&model, true)? {
//!     println!("{statement};");
//! }
//! ```
//!
//! Compilation is memoized by node hash. The memo lives only as long as
//! one top-level call, because a hash says nothing about how a node is
//! materialized.

pub mod cte;

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::config::CompilerSettings;
use crate::error::{GraphError, GraphResult};
use crate::graph::{find_all_nodes, reachable_nodes};
use crate::model::template::{derive_references, substitute, Placeholder, ID_PLACEHOLDER};
use crate::model::{Materialization, Model};
use crate::sql::quote::{quote_identifier, truncate_name};

use cte::{split_ctes, Fragment};

// ============================================================================
// Compiler
// ============================================================================

/// Entry point for SQL generation.
#[derive(Debug, Clone, Default)]
pub struct Compiler {
    settings: CompilerSettings,
}

impl Compiler {
    pub fn new(settings: CompilerSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &CompilerSettings {
        &self.settings
    }

    /// Quoted name under which `model` is emitted or referenced.
    ///
    /// `quote(truncate(generic_name) + separator + hash)`, unless a
    /// view or table carries an explicit materialization name.
    pub fn model_name(&self, model: &Model) -> String {
        if matches!(
            model.materialization(),
            Materialization::View | Materialization::Table | Materialization::TempTable
        ) {
            if let Some(name) = model.materialization_name() {
                return quote_identifier(&name);
            }
        }

        quote_identifier(&format!(
            "{}{}{}",
            truncate_name(model.generic_name(), self.settings.name_prefix_length),
            self.settings.name_separator,
            model.hash()
        ))
    }

    /// Compile one model into a single executable statement.
    pub fn compile_one(&self, model: &Model) -> GraphResult<String> {
        let mut session = Session::new(self, model)?;
        session.statement(model)
    }

    /// Compile every statement-level node reachable from `model`.
    ///
    /// Dependencies come before their dependents. The start node is
    /// included when `include_model` is set, whatever its materialization
    /// (a virtual start node is skipped).
    pub fn compile_reachable(&self, model: &Model, include_model: bool) -> GraphResult<Vec<String>> {
        let mut session = Session::new(self, model)?;

        let targets = find_all_nodes(
            model,
            |m| {
                if Model::ptr_eq(m, model) {
                    include_model && m.materialization() != Materialization::Virtual
                } else {
                    m.materialization().is_statement()
                }
            },
            true,
        );

        let mut emitted: HashSet<String> = HashSet::new();
        let mut statements = Vec::with_capacity(targets.len());
        for (node, path) in targets.into_iter().rev() {
            if !emitted.insert(node.hash().to_string()) {
                continue;
            }
            log::debug!(
                "emitting {} {} at {}",
                node.materialization(),
                node.generic_name(),
                path
            );
            statements.push(session.statement(&node)?);
        }

        Ok(statements)
    }
}

/// Compile one model with default settings.
pub fn compile_one(model: &Model) -> GraphResult<String> {
    Compiler::default().compile_one(model)
}

/// Compile every statement-level node reachable from `model` with default settings.
pub fn compile_reachable(model: &Model, include_model: bool) -> GraphResult<Vec<String>> {
    Compiler::default().compile_reachable(model, include_model)
}

// ============================================================================
// Session
// ============================================================================

/// A node compiled down to its CTE fragments and its body.
#[derive(Debug)]
struct Compiled {
    /// Deduplicated fragments the body depends on, dependencies first.
    fragments: Vec<Fragment>,
    body: String,
}

/// Per-call compilation state.
struct Session<'c> {
    compiler: &'c Compiler,
    compiled: HashMap<String, Rc<Compiled>>,
}

impl<'c> Session<'c> {
    /// Start a session after checking that equal hashes agree on
    /// materialization throughout the graph.
    fn new(compiler: &'c Compiler, root: &Model) -> GraphResult<Self> {
        let mut seen: HashMap<String, (Materialization, Option<String>)> = HashMap::new();
        for node in reachable_nodes(root) {
            let current = (node.materialization(), node.materialization_name());
            match seen.entry(node.hash().to_string()) {
                Entry::Occupied(previous) if *previous.get() != current => {
                    return Err(GraphError::HashAmbiguity {
                        hash: node.hash().to_string(),
                        first: describe(previous.get()),
                        second: describe(&current),
                    });
                }
                Entry::Occupied(_) => {}
                Entry::Vacant(slot) => {
                    slot.insert(current);
                }
            }
        }

        Ok(Self {
            compiler,
            compiled: HashMap::new(),
        })
    }

    /// Full statement for `model`, wrapped per its materialization.
    fn statement(&mut self, model: &Model) -> GraphResult<String> {
        let materialization = model.materialization();
        if materialization == Materialization::Virtual {
            return Err(GraphError::VirtualModel {
                model: model.generic_name().to_string(),
            });
        }

        let compiled = self.compile(model)?;
        let select = self.with_clause(&compiled);

        Ok(match materialization {
            Materialization::Cte | Materialization::Query | Materialization::Virtual => select,
            Materialization::View => {
                format!("create view {} as {}", self.compiler.model_name(model), select)
            }
            Materialization::Table => {
                format!("create table {} as {}", self.compiler.model_name(model), select)
            }
            Materialization::TempTable => format!(
                "create temporary table {} on commit drop as {}",
                self.compiler.model_name(model),
                select
            ),
        })
    }

    fn with_clause(&self, compiled: &Compiled) -> String {
        if compiled.fragments.is_empty() {
            return compiled.body.clone();
        }

        let (sep, before_body) = if self.compiler.settings.pretty {
            (",\n", "\n")
        } else {
            (", ", " ")
        };
        let ctes = compiled
            .fragments
            .iter()
            .map(|f| format!("{} as ({})", f.name, f.sql))
            .collect::<Vec<_>>()
            .join(sep);
        format!("with {}{}{}", ctes, before_body, compiled.body)
    }

    /// Compile `root` and every CTE it inlines, children first.
    fn compile(&mut self, root: &Model) -> GraphResult<Rc<Compiled>> {
        let mut stack = vec![(root.clone(), false)];

        while let Some((model, children_done)) = stack.pop() {
            if self.compiled.contains_key(model.hash()) {
                continue;
            }
            if children_done {
                let compiled = self.assemble(&model)?;
                self.compiled
                    .insert(model.hash().to_string(), Rc::new(compiled));
                continue;
            }

            let pending: Vec<Model> = inlined_references(&model)
                .into_iter()
                .filter(|(_, child)| !self.compiled.contains_key(child.hash()))
                .map(|(_, child)| child)
                .collect();
            stack.push((model, true));
            stack.extend(pending.into_iter().rev().map(|child| (child, false)));
        }

        Ok(self.compiled[root.hash()].clone())
    }

    /// Build one node from its already compiled children.
    fn assemble(&self, model: &Model) -> GraphResult<Compiled> {
        let mut fragments: Vec<Fragment> = Vec::new();

        for (_, child) in inlined_references(model) {
            let compiled = &self.compiled[child.hash()];
            for fragment in &compiled.fragments {
                push_unique(&mut fragments, fragment.clone())?;
            }
            push_unique(
                &mut fragments,
                Fragment::new(self.compiler.model_name(&child), compiled.body.clone()),
            )?;
        }

        let formatted = substitute(model.sql_template(), |placeholder| match placeholder {
            Placeholder::Reference(ID_PLACEHOLDER) => Ok(Some(model.hash().to_string())),
            Placeholder::Reference(name) => Ok(model
                .reference(name)
                .map(|child| self.compiler.model_name(child))),
            Placeholder::Property(name) => match model.property(name) {
                Some(value) => model.spec().format_property(name, value).map(Some),
                None => Ok(None),
            },
        })?;

        let (own, body) = split_ctes(&formatted).map_err(|message| GraphError::MalformedTemplate {
            model: model.generic_name().to_string(),
            message,
        })?;
        for fragment in own {
            push_unique(&mut fragments, fragment)?;
        }

        log::trace!(
            "compiled {} ({}) with {} fragment(s)",
            model.generic_name(),
            model.hash(),
            fragments.len()
        );
        Ok(Compiled { fragments, body })
    }
}

/// CTE-materialized references: template references in order of first
/// appearance, then references the template never mentions, by name.
fn inlined_references(model: &Model) -> Vec<(String, Model)> {
    let mut names = derive_references(model.sql_template());
    let unmentioned: Vec<String> = model
        .references()
        .keys()
        .filter(|name| !names.contains(name))
        .cloned()
        .collect();
    names.extend(unmentioned);

    names
        .into_iter()
        .filter_map(|name| {
            let child = model.reference(&name)?.clone();
            child.materialization().is_cte().then_some((name, child))
        })
        .collect()
}

/// Append a fragment unless an identical one is already present.
fn push_unique(fragments: &mut Vec<Fragment>, fragment: Fragment) -> GraphResult<()> {
    match fragments.iter().find(|f| f.key == fragment.key) {
        Some(existing) if existing.sql == fragment.sql => {
            log::trace!("skipping duplicate fragment {}", fragment.name);
            Ok(())
        }
        Some(_) => Err(GraphError::NameConflict {
            name: fragment.name,
        }),
        None => {
            fragments.push(fragment);
            Ok(())
        }
    }
}

fn describe((materialization, name): &(Materialization, Option<String>)) -> String {
    match name {
        Some(n) => format!("{} '{}'", materialization, n),
        None => materialization.to_string(),
    }
}
