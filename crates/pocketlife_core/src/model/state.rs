//! Typed mirror of the observable store tree.
//!
//! # Responsibility
//! - Define the full in-memory state shape as one serde-friendly struct.
//! - Supply the documented default empty state used when nothing is persisted
//!   or the persisted blob cannot be decoded.
//!
//! # Invariants
//! - Field names here are the store's top-level node names; renaming a field
//!   is a snapshot format change and requires a version bump.

use crate::model::note::{Folder, FolderId, Note, NoteId};
use crate::model::prefs::UserPreferences;
use crate::model::ui::UiState;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Complete application state as stored in the observable tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppState {
    /// Flat notes mapping keyed by stable id.
    pub notes: BTreeMap<NoteId, Note>,
    /// Flat folders mapping keyed by stable id.
    pub folders: BTreeMap<FolderId, Folder>,
    /// Transient UI state.
    pub ui: UiState,
    /// Durable user preferences.
    pub prefs: UserPreferences,
}

#[cfg(test)]
mod tests {
    use super::AppState;

    #[test]
    fn default_state_has_expected_top_level_nodes() {
        let value = serde_json::to_value(AppState::default()).unwrap();
        let object = value.as_object().unwrap();
        for node in ["notes", "folders", "ui", "prefs"] {
            assert!(object.contains_key(node), "missing node `{node}`");
        }
    }

    #[test]
    fn state_round_trips_through_json() {
        let state = AppState::default();
        let value = serde_json::to_value(&state).unwrap();
        let back: AppState = serde_json::from_value(value).unwrap();
        assert_eq!(back, state);
    }
}
