//! Versioned snapshot of the full application state.
//!
//! # Responsibility
//! - Capture store tree + pending change log into one encodable value.
//! - Gate decoding on `format_version` so schema evolution stays safe.
//!
//! # Invariants
//! - `decode(encode(snapshot)) == snapshot` structurally.
//! - A payload with a newer `format_version` than this binary supports is a
//!   decode failure, not a partial read.

use crate::model::state::AppState;
use crate::persist::{PersistError, PersistResult};
use crate::queue::{ChangeRecord, OfflineChangeQueue};
use crate::store::{ObservableStore, StorePath};
use serde::{Deserialize, Serialize};

/// Current snapshot payload format.
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// Everything the binder persists: the state tree plus the offline log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    /// Payload format marker; bump on any shape change.
    pub format_version: u32,
    /// The full typed state tree.
    #[serde(flatten)]
    pub state: AppState,
    /// Offline change log, front first.
    pub pending_changes: Vec<ChangeRecord>,
}

impl Default for StoreSnapshot {
    fn default() -> Self {
        Self {
            format_version: SNAPSHOT_FORMAT_VERSION,
            state: AppState::default(),
            pending_changes: Vec::new(),
        }
    }
}

impl StoreSnapshot {
    /// Reads the live store tree and queue into a snapshot.
    ///
    /// Fails with [`PersistError::Shape`] when the tree no longer matches
    /// the typed state models; that indicates a store-writer bug, never a
    /// user error.
    pub fn capture(store: &ObservableStore, queue: &OfflineChangeQueue) -> PersistResult<Self> {
        let root = store
            .read(&StorePath::root())
            .map_err(|err| PersistError::Shape(err.to_string()))?;
        let state: AppState = serde_json::from_value(root)
            .map_err(|err| PersistError::Shape(err.to_string()))?;
        Ok(Self {
            format_version: SNAPSHOT_FORMAT_VERSION,
            state,
            pending_changes: queue.pending(),
        })
    }

    /// Installs this snapshot into the live store and queue.
    pub fn apply(self, store: &ObservableStore, queue: &OfflineChangeQueue) -> PersistResult<()> {
        let root = serde_json::to_value(&self.state).map_err(PersistError::Encode)?;
        store
            .write(&StorePath::root(), root)
            .map_err(|err| PersistError::Shape(err.to_string()))?;
        queue.restore(self.pending_changes);
        Ok(())
    }

    /// Serializes to the on-disk byte payload.
    pub fn encode(&self) -> PersistResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(PersistError::Encode)
    }

    /// Parses an on-disk payload, rejecting newer format versions before
    /// attempting the full structural decode.
    pub fn decode(bytes: &[u8]) -> PersistResult<Self> {
        let probe: serde_json::Value = serde_json::from_slice(bytes).map_err(PersistError::Decode)?;
        let found = probe
            .get("format_version")
            .and_then(serde_json::Value::as_u64)
            .unwrap_or(0) as u32;
        if found > SNAPSHOT_FORMAT_VERSION {
            return Err(PersistError::UnsupportedVersion {
                found,
                supported: SNAPSHOT_FORMAT_VERSION,
            });
        }
        serde_json::from_value(probe).map_err(PersistError::Decode)
    }
}

#[cfg(test)]
mod tests {
    use super::{StoreSnapshot, SNAPSHOT_FORMAT_VERSION};
    use crate::model::note::Note;
    use crate::persist::PersistError;
    use crate::queue::{ChangeOp, EntityKind, OfflineChangeQueue};
    use crate::store::ObservableStore;
    use serde_json::json;

    #[test]
    fn encode_decode_is_structural_identity() {
        let mut snapshot = StoreSnapshot::default();
        let note = Note::new("title", "body");
        snapshot.state.notes.insert(note.id, note);

        let bytes = snapshot.encode().unwrap();
        let decoded = StoreSnapshot::decode(&bytes).unwrap();
        assert_eq!(decoded, snapshot);
    }

    #[test]
    fn capture_reflects_store_and_queue() {
        let store = ObservableStore::new();
        let queue = OfflineChangeQueue::new();
        queue.enqueue(ChangeOp::Create, EntityKind::Note, json!({"x": 1}));

        let snapshot = StoreSnapshot::capture(&store, &queue).unwrap();
        assert_eq!(snapshot.format_version, SNAPSHOT_FORMAT_VERSION);
        assert!(snapshot.state.notes.is_empty());
        assert_eq!(snapshot.pending_changes.len(), 1);
    }

    #[test]
    fn garbage_bytes_fail_as_decode() {
        let err = StoreSnapshot::decode(b"{not json").unwrap_err();
        assert!(matches!(err, PersistError::Decode(_)));
    }

    #[test]
    fn newer_format_version_is_rejected() {
        let mut value = serde_json::to_value(StoreSnapshot::default()).unwrap();
        value["format_version"] = json!(SNAPSHOT_FORMAT_VERSION + 1);
        let bytes = serde_json::to_vec(&value).unwrap();
        let err = StoreSnapshot::decode(&bytes).unwrap_err();
        assert!(matches!(err, PersistError::UnsupportedVersion { .. }));
    }
}
