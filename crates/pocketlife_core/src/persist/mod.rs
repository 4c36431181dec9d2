//! Durable persistence: adapter boundary, snapshot codec, debounced binder.
//!
//! # Responsibility
//! - Keep durable storage eventually consistent with the observable store
//!   without ever blocking or failing a UI mutation.
//! - Contain every persistence failure inside this layer; the worst outcome
//!   of a broken disk is a diagnostic flag and a bounded data-loss window.
//!
//! # Invariants
//! - Hydration never fails startup: absent or undecodable bytes yield the
//!   documented default state.
//! - Only the final state of a write burst is ever flushed (trailing-edge
//!   debounce); intermediate states are never written.

mod adapter;
mod binder;
mod debounce;
mod snapshot;
mod sqlite;

pub use adapter::{MemoryAdapter, PersistenceAdapter};
pub use binder::{PersistenceBinder, DEFAULT_QUIET_WINDOW};
pub use debounce::DebounceTimer;
pub use snapshot::{StoreSnapshot, SNAPSHOT_FORMAT_VERSION};
pub use sqlite::SqliteBlobAdapter;

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type PersistResult<T> = Result<T, PersistError>;

/// Persistence-layer error taxonomy.
#[derive(Debug)]
pub enum PersistError {
    /// Underlying storage failed a load or save.
    Db(DbError),
    /// Current state could not be encoded for flush.
    Encode(serde_json::Error),
    /// Persisted bytes do not parse; hydration falls back to defaults.
    Decode(serde_json::Error),
    /// Persisted snapshot was written by a newer format.
    UnsupportedVersion { found: u32, supported: u32 },
    /// The live state tree does not match the snapshot shape.
    Shape(String),
}

impl Display for PersistError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Encode(err) => write!(f, "snapshot encode failed: {err}"),
            Self::Decode(err) => write!(f, "snapshot decode failed: {err}"),
            Self::UnsupportedVersion { found, supported } => write!(
                f,
                "snapshot format version {found} is newer than supported {supported}"
            ),
            Self::Shape(details) => write!(f, "state tree shape mismatch: {details}"),
        }
    }
}

impl Error for PersistError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Encode(err) | Self::Decode(err) => Some(err),
            Self::UnsupportedVersion { .. } => None,
            Self::Shape(_) => None,
        }
    }
}

impl From<DbError> for PersistError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for PersistError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}
