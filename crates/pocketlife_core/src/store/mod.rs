//! Observable state store.
//!
//! # Responsibility
//! - Hold the canonical in-memory state tree and expose path-scoped
//!   read/write/merge/remove operations.
//! - Notify subscribers synchronously, in registration order, exactly once
//!   per logical write.
//!
//! # Invariants
//! - The store is the single mutable source of truth; no collaborator holds
//!   a second writable reference into the tree.
//! - A failed write never corrupts sibling nodes.
//! - Notification is single-pass: writes issued from inside a callback are
//!   applied immediately but their notifications join the active cascade,
//!   and no subscriber is re-entered within one cascade.

mod observable;
mod path;

pub use observable::{ObservableStore, StoreEvent, StoreWriteKind, Subscription};
pub use path::StorePath;

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Top-level node holding the notes mapping.
pub const NOTES_NODE: &str = "notes";
/// Top-level node holding the folders mapping.
pub const FOLDERS_NODE: &str = "folders";
/// Top-level node holding transient UI state.
pub const UI_NODE: &str = "ui";
/// Top-level node holding user preferences.
pub const PREFS_NODE: &str = "prefs";

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors from store path operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Path does not resolve to an existing entry; callers may treat the
    /// operation as a no-op.
    NotFound(StorePath),
    /// Path traverses a value that is not an object.
    NotAnObject(StorePath),
    /// Path string is malformed (empty segment or blank input).
    InvalidPath(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(path) => write!(f, "store path not found: {path}"),
            Self::NotAnObject(path) => write!(f, "store path is not an object: {path}"),
            Self::InvalidPath(raw) => write!(f, "invalid store path: `{raw}`"),
        }
    }
}

impl Error for StoreError {}
