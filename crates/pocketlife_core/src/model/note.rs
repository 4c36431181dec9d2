//! Note and folder domain records.
//!
//! # Responsibility
//! - Define the flat note mapping entry and the folder grouping record.
//! - Provide constructors and edit helpers that keep timestamps honest.
//!
//! # Invariants
//! - `id` is stable for the record lifetime and never reused.
//! - A folder never physically contains notes; `Note::folder_id` is a weak
//!   reference by id and may dangle after a folder delete until detached.
//! - `updated_at_ms >= created_at_ms` for every persisted record.

use crate::model::epoch_ms_now;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Stable identifier for one note.
pub type NoteId = Uuid;

/// Stable identifier for one folder.
pub type FolderId = Uuid;

/// One entry in the top-level notes mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Stable global ID used for linking, selection and offline replay.
    pub id: NoteId,
    /// Short display title.
    pub title: String,
    /// Free-form body text.
    pub body: String,
    /// Weak reference to the containing folder, if any.
    pub folder_id: Option<FolderId>,
    /// Normalized tag set; `BTreeSet` keeps snapshot encoding deterministic.
    pub tags: BTreeSet<String>,
    /// Epoch ms creation timestamp.
    pub created_at_ms: i64,
    /// Epoch ms of the last edit.
    pub updated_at_ms: i64,
    /// User bookmark flag.
    pub bookmarked: bool,
}

impl Note {
    /// Creates a new note with a generated stable ID and current timestamps.
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        let now = epoch_ms_now();
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            body: body.into(),
            folder_id: None,
            tags: BTreeSet::new(),
            created_at_ms: now,
            updated_at_ms: now,
            bookmarked: false,
        }
    }

    /// Bumps the edit timestamp after an in-place mutation.
    pub fn touch(&mut self) {
        let now = epoch_ms_now();
        if now > self.updated_at_ms {
            self.updated_at_ms = now;
        }
    }
}

/// Grouping record; owns member notes by reference only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    /// Stable folder ID.
    pub id: FolderId,
    /// User-facing folder name.
    pub name: String,
    /// Ordering hint for sidebar display; lower sorts first.
    pub sort_order: i64,
}

impl Folder {
    /// Creates a folder with a generated stable ID.
    pub fn new(name: impl Into<String>, sort_order: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            sort_order,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Folder, Note};

    #[test]
    fn new_note_starts_clean() {
        let note = Note::new("title", "body");
        assert!(note.folder_id.is_none());
        assert!(note.tags.is_empty());
        assert!(!note.bookmarked);
        assert_eq!(note.created_at_ms, note.updated_at_ms);
    }

    #[test]
    fn touch_never_moves_updated_backwards() {
        let mut note = Note::new("t", "b");
        note.updated_at_ms = i64::MAX;
        note.touch();
        assert_eq!(note.updated_at_ms, i64::MAX);
    }

    #[test]
    fn folders_get_distinct_ids() {
        let a = Folder::new("inbox", 0);
        let b = Folder::new("inbox", 1);
        assert_ne!(a.id, b.id);
    }
}
