//! Dot-separated store paths.
//!
//! # Invariants
//! - Segments are non-empty and carry no surrounding whitespace.
//! - The empty path addresses the tree root and overlaps every path.

use crate::store::{StoreError, StoreResult};
use std::fmt::{Display, Formatter};

/// Location of one value in the store tree, e.g. `notes.<id>.title`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct StorePath {
    segments: Vec<String>,
}

impl StorePath {
    /// Returns the root path addressing the whole tree.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parses a dot-separated path string.
    ///
    /// The empty (or all-whitespace) string parses to the root path. Any
    /// empty segment (`"notes..title"`) is rejected.
    pub fn parse(raw: &str) -> StoreResult<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(Self::root());
        }
        let mut segments = Vec::new();
        for segment in trimmed.split('.') {
            let segment = segment.trim();
            if segment.is_empty() {
                return Err(StoreError::InvalidPath(raw.to_string()));
            }
            segments.push(segment.to_string());
        }
        Ok(Self { segments })
    }

    /// Builds a path from already-validated segments.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns a new path with one segment appended.
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns whether `self` addresses `other` or one of its ancestors.
    pub fn is_ancestor_or_equal(&self, other: &StorePath) -> bool {
        if self.segments.len() > other.segments.len() {
            return false;
        }
        self.segments
            .iter()
            .zip(other.segments.iter())
            .all(|(a, b)| a == b)
    }

    /// Returns whether a write at `written` must notify a subscriber
    /// registered at `self`: true when either path is an ancestor of (or
    /// equal to) the other.
    pub fn overlaps(&self, written: &StorePath) -> bool {
        self.is_ancestor_or_equal(written) || written.is_ancestor_or_equal(self)
    }
}

impl Display for StorePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.is_root() {
            return write!(f, "<root>");
        }
        write!(f, "{}", self.segments.join("."))
    }
}
