//! Identifier and string-literal quoting.
//!
//! Both forms double their delimiter inside the quoted text:
//!
//! ```text
//! identifier  a"b   ->  "a""b"
//! literal     it's  ->  'it''s'
//! ```

// =============================================================================
// Quoting
// =============================================================================

/// Quote an identifier with double quotes, doubling any embedded `"`.
pub fn quote_identifier(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Quote a string literal with single quotes, doubling any embedded `'`.
pub fn quote_string(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

// =============================================================================
// Unquoting
// =============================================================================

/// Inverse of [`quote_identifier`].
///
/// Returns `None` when the input is not a well-formed quoted identifier.
pub fn unquote_identifier(quoted: &str) -> Option<String> {
    unquote_with(quoted, '"')
}

/// Inverse of [`quote_string`].
///
/// Returns `None` when the input is not a well-formed string literal.
pub fn unquote_string(quoted: &str) -> Option<String> {
    unquote_with(quoted, '\'')
}

fn unquote_with(quoted: &str, delim: char) -> Option<String> {
    let inner = quoted.strip_prefix(delim)?.strip_suffix(delim)?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();

    while let Some(c) = chars.next() {
        if c == delim {
            // A lone delimiter inside the body is malformed.
            if chars.next() != Some(delim) {
                return None;
            }
        }
        out.push(c);
    }

    Some(out)
}

// =============================================================================
// Names
// =============================================================================

/// Truncate a display name to at most `max_chars` characters.
///
/// Counts characters rather than bytes so multi-byte names are never
/// split inside a code point.
pub fn truncate_name(name: &str, max_chars: usize) -> &str {
    match name.char_indices().nth(max_chars) {
        Some((idx, _)) => &name[..idx],
        None => name,
    }
}
