//! Graph operations over model DAGs.
//!
//! All traversals use explicit worklists so arbitrarily deep graphs
//! never exhaust the call stack. Nodes shared by several parents are
//! visited once.
//!
//! - [`find_node`] / [`find_all_nodes`] - search by predicate, returning paths
//! - [`node_at_path`] - follow a path from the root
//! - [`replace_node_in_graph`] - copy-on-write replacement along a path

mod path;


use std::collections::{HashMap, HashSet};

pub use path::ReferencePath;

use crate::error::{GraphError, GraphResult};
use crate::model::Model;

/// Every distinct node reachable from `root` (root first, depth-first).
pub fn reachable_nodes(root: &Model) -> Vec<Model> {
    preorder(root).into_iter().map(|(m, _)| m).collect()
}

/// First node satisfying `predicate`, with the path used to reach it.
///
/// With `prefer_longest_path` the match reached by the longest reference
/// path wins, and the returned path is that longest path.
pub fn find_node<F>(
    root: &Model,
    mut predicate: F,
    prefer_longest_path: bool,
) -> Option<(Model, ReferencePath)>
where
    F: FnMut(&Model) -> bool,
{
    if prefer_longest_path {
        longest_paths(root)
            .into_iter()
            .filter(|(m, _)| predicate(m))
            .fold(None, |best: Option<(Model, ReferencePath)>, candidate| match best {
                Some(b) if b.1.len() >= candidate.1.len() => Some(b),
                _ => Some(candidate),
            })
    } else {
        preorder(root).into_iter().find(|(m, _)| predicate(m))
    }
}

/// Every distinct node satisfying `predicate`, each with one path.
///
/// With `prefer_longest_path` each path is the longest route to its node
/// and results are ordered by path length, shortest first. Any node then
/// appears after every node that depends on it.
pub fn find_all_nodes<F>(
    root: &Model,
    mut predicate: F,
    prefer_longest_path: bool,
) -> Vec<(Model, ReferencePath)>
where
    F: FnMut(&Model) -> bool,
{
    if prefer_longest_path {
        let mut found: Vec<_> = longest_paths(root)
            .into_iter()
            .filter(|(m, _)| predicate(m))
            .collect();
        found.sort_by_key(|(_, p)| p.len());
        found
    } else {
        preorder(root)
            .into_iter()
            .filter(|(m, _)| predicate(m))
            .collect()
    }
}

/// Follow `path` from `root`.
pub fn node_at_path(root: &Model, path: &ReferencePath) -> GraphResult<Model> {
    let mut current = root.clone();
    for segment in path.iter() {
        current = current
            .reference(segment)
            .cloned()
            .ok_or_else(|| GraphError::PathNotFound {
                path: path.to_string(),
            })?;
    }
    Ok(current)
}

/// Replace the node at `path` and rebuild only its ancestors.
///
/// Each ancestor on the path is copied with the one child on the path
/// swapped; every other reference is reused as-is. `root` and all nodes
/// off the path are left untouched.
pub fn replace_node_in_graph(
    root: &Model,
    path: &ReferencePath,
    replacement: Model,
) -> GraphResult<Model> {
    let mut ancestors = Vec::with_capacity(path.len());
    let mut current = root.clone();
    for segment in path.iter() {
        let next = current
            .reference(segment)
            .cloned()
            .ok_or_else(|| GraphError::PathNotFound {
                path: path.to_string(),
            })?;
        ancestors.push(current);
        current = next;
    }

    let mut new_node = replacement;
    for (ancestor, segment) in ancestors.iter().zip(path.segments()).rev() {
        new_node = ancestor.copy_link([(segment.as_str(), new_node)])?;
    }

    log::debug!(
        "replaced node at {} under {} ({} -> {})",
        path,
        root.generic_name(),
        root.hash(),
        new_node.hash()
    );
    Ok(new_node)
}

// =============================================================================
// Traversal internals
// =============================================================================

/// Depth-first preorder over distinct nodes, references visited in name order.
fn preorder(root: &Model) -> Vec<(Model, ReferencePath)> {
    let mut seen: HashSet<usize> = HashSet::new();
    let mut out = Vec::new();
    let mut stack = vec![(root.clone(), ReferencePath::new())];

    while let Some((model, path)) = stack.pop() {
        if !seen.insert(model.node_id()) {
            continue;
        }
        for (name, child) in model.references().iter().rev() {
            if !seen.contains(&child.node_id()) {
                stack.push((child.clone(), path.child(name.as_str())));
            }
        }
        out.push((model, path));
    }

    out
}

/// Distinct nodes in topological order (parents first).
fn topological(root: &Model) -> Vec<Model> {
    let mut seen: HashSet<usize> = HashSet::new();
    let mut postorder = Vec::new();
    let mut stack = vec![(root.clone(), false)];

    while let Some((model, expanded)) = stack.pop() {
        if expanded {
            postorder.push(model);
            continue;
        }
        if !seen.insert(model.node_id()) {
            continue;
        }
        let children: Vec<Model> = model
            .references()
            .values()
            .rev()
            .filter(|c| !seen.contains(&c.node_id()))
            .cloned()
            .collect();
        stack.push((model, true));
        stack.extend(children.into_iter().map(|c| (c, false)));
    }

    postorder.reverse();
    postorder
}

/// Every distinct node with its longest path from `root`, topological order.
fn longest_paths(root: &Model) -> Vec<(Model, ReferencePath)> {
    let order = topological(root);

    // node id -> (depth, parent id, reference name)
    let mut best: HashMap<usize, (usize, Option<(usize, String)>)> = HashMap::new();
    best.insert(root.node_id(), (0, None));

    for model in &order {
        let depth = match best.get(&model.node_id()) {
            Some((d, _)) => *d,
            None => continue,
        };
        for (name, child) in model.references() {
            let candidate = depth + 1;
            let improves = best
                .get(&child.node_id())
                .map_or(true, |(d, _)| candidate > *d);
            if improves {
                best.insert(
                    child.node_id(),
                    (candidate, Some((model.node_id(), name.clone()))),
                );
            }
        }
    }

    order
        .into_iter()
        .map(|model| {
            let mut segments = Vec::new();
            let mut cursor = model.node_id();
            while let Some((_, Some((parent, name)))) = best.get(&cursor) {
                segments.push(name.clone());
                cursor = *parent;
            }
            segments.reverse();
            (model, ReferencePath::from(segments))
        })
        .collect()
}
