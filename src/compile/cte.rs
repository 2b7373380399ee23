//! Splitting a formatted template into its own CTE fragments and body.
//!
//! A template may open its own `with` clause:
//!
//! ```text
//! with "totals_<hash>" as (select ...), ranked as (select ...) select ...
//! ```
//!
//! Each named entry becomes a fragment and the trailing statement is the
//! body. Names are emitted exactly as written; fragments are compared by
//! the relation they name (bare names fold to lowercase, quoted names are
//! kept verbatim). `with recursive` is never split.

use crate::sql::quote::{quote_identifier, unquote_identifier};

/// A named CTE entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    /// Name as emitted, bare or quoted.
    pub name: String,
    /// Quoted, case-resolved form of `name` used for comparison.
    pub key: String,
    pub sql: String,
}

impl Fragment {
    pub fn new(name: impl Into<String>, sql: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            key: relation_key(&name),
            name,
            sql: sql.into(),
        }
    }
}

/// The relation a CTE name refers to, as a quoted identifier.
///
/// Bare names fold to lowercase the way Postgres folds unquoted identifiers.
pub fn relation_key(name: &str) -> String {
    match unquote_identifier(name) {
        Some(unquoted) => quote_identifier(&unquoted),
        None => quote_identifier(&name.to_lowercase()),
    }
}

/// Split `sql` into its leading CTE fragments and its body.
///
/// Text that does not start with `with` is returned whole as the body.
pub fn split_ctes(sql: &str) -> Result<(Vec<Fragment>, String), String> {
    let mut cursor = Cursor::new(sql);
    cursor.skip_ws();

    if !cursor.eat_keyword("with") {
        return Ok((Vec::new(), sql.to_string()));
    }
    cursor.skip_ws();
    if cursor.peek_keyword("recursive") {
        return Ok((Vec::new(), sql.to_string()));
    }

    let mut fragments = Vec::new();
    loop {
        cursor.skip_ws();
        let name = cursor.name()?;
        cursor.skip_ws();
        if !cursor.eat_keyword("as") {
            return Err(format!("expected 'as' after CTE name {}", name));
        }
        cursor.skip_ws();
        let body = cursor.parenthesized()?;
        fragments.push(Fragment::new(name, body.trim()));

        cursor.skip_ws();
        if !cursor.eat_char(',') {
            break;
        }
    }

    let body = cursor.rest().trim();
    if body.is_empty() {
        return Err("with clause has no body".to_string());
    }
    Ok((fragments, body.to_string()))
}

struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn eat_char(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.bump();
            true
        } else {
            false
        }
    }

    /// Keyword match: case-insensitive, not followed by an identifier char.
    fn peek_keyword(&self, kw: &str) -> bool {
        let rest = self.rest();
        match rest.get(..kw.len()) {
            Some(head) if head.eq_ignore_ascii_case(kw) => !rest[kw.len()..]
                .chars()
                .next()
                .is_some_and(is_ident_char),
            _ => false,
        }
    }

    fn eat_keyword(&mut self, kw: &str) -> bool {
        if self.peek_keyword(kw) {
            self.pos += kw.len();
            true
        } else {
            false
        }
    }

    /// A quoted or bare CTE name, as written.
    fn name(&mut self) -> Result<&'a str, String> {
        let start = self.pos;
        if self.peek() == Some('"') {
            self.quoted('"')?;
            return Ok(&self.src[start..self.pos]);
        }

        while self.peek().is_some_and(is_ident_char) {
            self.bump();
        }
        if start == self.pos {
            return Err(format!("expected CTE name at offset {}", start));
        }
        Ok(&self.src[start..self.pos])
    }

    /// Consume a delimited token starting at the opening delimiter.
    fn quoted(&mut self, delim: char) -> Result<(), String> {
        let start = self.pos;
        self.bump();
        loop {
            match self.bump() {
                Some(c) if c == delim => {
                    if self.peek() == Some(delim) {
                        self.bump();
                    } else {
                        return Ok(());
                    }
                }
                Some(_) => {}
                None => return Err(format!("unterminated {} at offset {}", delim, start)),
            }
        }
    }

    /// Contents of a balanced `( ... )`, skipping over quoted text.
    fn parenthesized(&mut self) -> Result<&'a str, String> {
        if self.peek() != Some('(') {
            return Err(format!("expected '(' at offset {}", self.pos));
        }
        self.bump();
        let start = self.pos;
        let mut depth = 1usize;

        while let Some(c) = self.peek() {
            match c {
                '\'' | '"' => {
                    self.quoted(c)?;
                    continue;
                }
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        let inner = &self.src[start..self.pos];
                        self.bump();
                        return Ok(inner);
                    }
                }
                _ => {}
            }
            self.bump();
        }

        Err(format!("unbalanced parentheses from offset {}", start))
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
