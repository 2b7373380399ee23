//! Reference paths: a route from a root model to one of its descendants.

use std::fmt;

/// Ordered reference names leading from a root to a descendant.
///
/// The empty path addresses the root itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ReferencePath {
    segments: Vec<String>,
}

impl ReferencePath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn push(&mut self, segment: impl Into<String>) {
        self.segments.push(segment.into());
    }

    /// This path extended by one segment.
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut path = self.clone();
        path.push(segment);
        path
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &str> + ExactSizeIterator {
        self.segments.iter().map(String::as_str)
    }
}

impl fmt::Display for ReferencePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            write!(f, "<root>")
        } else {
            write!(f, "{}", self.segments.join("/"))
        }
    }
}

impl<S: Into<String>> FromIterator<S> for ReferencePath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            segments: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<Vec<String>> for ReferencePath {
    fn from(segments: Vec<String>) -> Self {
        Self { segments }
    }
}

impl From<&[&str]> for ReferencePath {
    fn from(segments: &[&str]) -> Self {
        segments.iter().copied().collect()
    }
}
