//! Transient UI state held in the store.
//!
//! # Invariants
//! - `selected_note_id`/`selected_folder_id` are weak references: they SHOULD
//!   point at an existing entry, and service-level deletes clear them when the
//!   target disappears. Readers must still tolerate a dangling value.

use crate::model::note::{FolderId, NoteId};
use serde::{Deserialize, Serialize};

/// Color theme selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    Light,
    Dark,
}

/// UI-facing state node (`ui` in the store tree).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiState {
    /// Active theme.
    pub theme: Theme,
    /// Whether the navigation sidebar is expanded.
    pub sidebar_open: bool,
    /// Currently selected note, if any.
    pub selected_note_id: Option<NoteId>,
    /// Currently selected folder, if any.
    pub selected_folder_id: Option<FolderId>,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            theme: Theme::Light,
            sidebar_open: true,
            selected_note_id: None,
            selected_folder_id: None,
        }
    }
}
