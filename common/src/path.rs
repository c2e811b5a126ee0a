//! Slash-delimited element paths such as `/settings/localRepository`.

use std::fmt;

/// An element path inside an XML document, held as ordered segments.
///
/// The path doubles as the running "where am I" state of a streaming parse:
/// start tags [`push`](Self::push) a segment and end tags
/// [`pop`](Self::pop) one.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TagPath {
    segments: Vec<String>,
}

impl TagPath {
    /// Builds a path from iterator segments.
    ///
    /// # Examples
    ///
    /// ```
    /// use bundle_common::path::TagPath;
    ///
    /// let path = TagPath::new(["settings", "localRepository"]);
    /// assert_eq!(path.segments(), &["settings", "localRepository"]);
    /// ```
    #[must_use]
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Parses a path from its textual representation.
    ///
    /// Empty segments produced by leading, trailing, or repeated separators are
    /// discarded.
    ///
    /// # Examples
    ///
    /// ```
    /// use bundle_common::path::TagPath;
    ///
    /// let parsed = TagPath::parse("/settings/localRepository");
    /// assert_eq!(parsed.segments(), &["settings", "localRepository"]);
    /// let compact = TagPath::parse("//settings/");
    /// assert_eq!(compact.segments(), &["settings"]);
    /// ```
    #[must_use]
    pub fn parse(path: &str) -> Self {
        Self::new(path.split('/').filter(|segment| !segment.is_empty()))
    }

    /// Returns the path segments as a slice.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Returns `true` when the path has no segments (document level).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Descends into a child element.
    pub fn push(&mut self, segment: impl Into<String>) {
        self.segments.push(segment.into());
    }

    /// Leaves the current element.
    ///
    /// Popping at document level is a no-op and returns `None`.
    pub fn pop(&mut self) -> Option<String> {
        self.segments.pop()
    }
}

impl fmt::Display for TagPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}
