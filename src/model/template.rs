//! Placeholder scanning and substitution for SQL templates.
//!
//! ```text
//! {name}     property placeholder
//! {{name}}   reference placeholder
//! {{id}}     reserved, replaced by the node's own hash
//! ```
//!
//! Anything else in braces (`{}`, `{ x }`, JSON) is left untouched.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::GraphResult;

/// Reserved reference-free placeholder resolved to the node hash.
pub const ID_PLACEHOLDER: &str = "id";

/// `{{name}}` in group 1, `{name}` in group 2.
static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{([A-Za-z_][A-Za-z0-9_]*)\}\}|\{([A-Za-z_][A-Za-z0-9_]*)\}").unwrap()
});

/// A placeholder found in a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder<'a> {
    /// `{{name}}`
    Reference(&'a str),
    /// `{name}`
    Property(&'a str),
}

/// All placeholders in order of appearance, duplicates included.
pub fn placeholders(template: &str) -> impl Iterator<Item = Placeholder<'_>> {
    PLACEHOLDER_RE.captures_iter(template).filter_map(|caps| {
        if let Some(m) = caps.get(1) {
            Some(Placeholder::Reference(m.as_str()))
        } else {
            caps.get(2).map(|m| Placeholder::Property(m.as_str()))
        }
    })
}

/// Reference names used by `template`, first appearance order, without `id`.
pub fn derive_references(template: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for p in placeholders(template) {
        if let Placeholder::Reference(name) = p {
            if name != ID_PLACEHOLDER && !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
    }
    names
}

/// Property names used by `template`, first appearance order.
pub fn derive_properties(template: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for p in placeholders(template) {
        if let Placeholder::Property(name) = p {
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
    }
    names
}

/// Replace every placeholder in a single pass.
///
/// `resolve` returns the replacement text, or `None` to keep the
/// placeholder as written. Replacement text is never rescanned.
pub fn substitute<F>(template: &str, mut resolve: F) -> GraphResult<String>
where
    F: FnMut(Placeholder<'_>) -> GraphResult<Option<String>>,
{
    let mut out = String::with_capacity(template.len());
    let mut last = 0;

    for caps in PLACEHOLDER_RE.captures_iter(template) {
        let Some(whole) = caps.get(0) else { continue };
        let placeholder = match (caps.get(1), caps.get(2)) {
            (Some(m), _) => Placeholder::Reference(m.as_str()),
            (None, Some(m)) => Placeholder::Property(m.as_str()),
            (None, None) => continue,
        };

        out.push_str(&template[last..whole.start()]);
        match resolve(placeholder)? {
            Some(text) => out.push_str(&text),
            None => out.push_str(whole.as_str()),
        }
        last = whole.end();
    }

    out.push_str(&template[last..]);
    Ok(out)
}
