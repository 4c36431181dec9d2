//! Workspace use-case service.
//!
//! # Responsibility
//! - Provide note/folder/selection/preferences operations over the store.
//! - Clear dangling selections when their target is deleted.
//! - Capture every offline note/folder mutation into the change queue.
//!
//! # Invariants
//! - Note and folder ids stay unique: creation always generates a fresh id
//!   and writes under it.
//! - `delete_note`/`delete_folder` never leave `ui.selected_*_id` pointing
//!   at the removed entity.
//! - Offline capture appends after the store write succeeded, so the queue
//!   never holds a change the local tree rejected.

use crate::model::note::{Folder, FolderId, Note, NoteId};
use crate::model::prefs::{LayoutMode, UserPreferences};
use crate::model::ui::Theme;
use crate::queue::{ChangeOp, ChangeRecord, EntityKind, OfflineChangeQueue};
use crate::store::{
    ObservableStore, StoreError, StorePath, StoreResult, FOLDERS_NODE, NOTES_NODE, PREFS_NODE,
    UI_NODE,
};
use serde_json::{json, Value};
use std::cell::Cell;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::rc::Rc;
use std::sync::Arc;

/// Reachability judgment for the remote service; flips at the UI boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connectivity {
    Online,
    Offline,
}

/// Service error for workspace use-cases.
#[derive(Debug)]
pub enum WorkspaceError {
    /// Target note does not exist.
    NoteNotFound(NoteId),
    /// Target folder does not exist.
    FolderNotFound(FolderId),
    /// Rejected preference value.
    InvalidPreference(&'static str),
    /// Store-level path failure.
    Store(StoreError),
    /// State tree entry no longer matches the typed model.
    Codec(serde_json::Error),
}

impl Display for WorkspaceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoteNotFound(id) => write!(f, "note not found: {id}"),
            Self::FolderNotFound(id) => write!(f, "folder not found: {id}"),
            Self::InvalidPreference(details) => write!(f, "invalid preference: {details}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::Codec(err) => write!(f, "invalid state tree entry: {err}"),
        }
    }
}

impl Error for WorkspaceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Codec(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for WorkspaceError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<serde_json::Error> for WorkspaceError {
    fn from(value: serde_json::Error) -> Self {
        Self::Codec(value)
    }
}

/// Partial note update; `None` fields keep their current value.
#[derive(Debug, Clone, Default)]
pub struct NotePatch {
    pub title: Option<String>,
    pub body: Option<String>,
    /// `Some(None)` detaches the note from its folder.
    pub folder_id: Option<Option<FolderId>>,
    pub tags: Option<Vec<String>>,
    pub bookmarked: Option<bool>,
}

/// Partial preferences update; `None` fields keep their current value.
#[derive(Debug, Clone, Default)]
pub struct PreferencesPatch {
    pub layout: Option<LayoutMode>,
    pub font_size: Option<u32>,
    pub theme: Option<Theme>,
    /// `Some(None)` signs the user out.
    pub user_id: Option<Option<String>>,
}

/// Use-case façade over the store, queue and connectivity judgment.
pub struct WorkspaceService {
    store: ObservableStore,
    queue: Arc<OfflineChangeQueue>,
    connectivity: Rc<Cell<Connectivity>>,
}

impl WorkspaceService {
    pub fn new(
        store: ObservableStore,
        queue: Arc<OfflineChangeQueue>,
        connectivity: Rc<Cell<Connectivity>>,
    ) -> Self {
        Self {
            store,
            queue,
            connectivity,
        }
    }

    /// Creates one note, optionally inside an existing folder.
    pub fn create_note(
        &self,
        title: impl Into<String>,
        body: impl Into<String>,
        folder_id: Option<FolderId>,
    ) -> Result<Note, WorkspaceError> {
        if let Some(folder_id) = folder_id {
            self.require_folder(folder_id)?;
        }
        let mut note = Note::new(title, body);
        note.folder_id = folder_id;
        self.store
            .write(&note_path(note.id), serde_json::to_value(&note)?)?;
        self.capture_offline(ChangeOp::Create, EntityKind::Note, serde_json::to_value(&note)?);
        Ok(note)
    }

    /// Applies a partial update and bumps the edit timestamp.
    pub fn update_note(&self, id: NoteId, patch: NotePatch) -> Result<Note, WorkspaceError> {
        let mut note = self.require_note(id)?;
        if let Some(title) = patch.title {
            note.title = title;
        }
        if let Some(body) = patch.body {
            note.body = body;
        }
        if let Some(folder_id) = patch.folder_id {
            if let Some(folder_id) = folder_id {
                self.require_folder(folder_id)?;
            }
            note.folder_id = folder_id;
        }
        if let Some(tags) = patch.tags {
            note.tags = tags.into_iter().collect();
        }
        if let Some(bookmarked) = patch.bookmarked {
            note.bookmarked = bookmarked;
        }
        note.touch();
        self.store
            .write(&note_path(id), serde_json::to_value(&note)?)?;
        self.capture_offline(ChangeOp::Update, EntityKind::Note, serde_json::to_value(&note)?);
        Ok(note)
    }

    /// Removes one note and clears a selection that pointed at it.
    pub fn delete_note(&self, id: NoteId) -> Result<Note, WorkspaceError> {
        let note = self.require_note(id)?;
        self.store.remove(&note_path(id))?;
        self.clear_selection_if(selected_note_path(), id)?;
        self.capture_offline(ChangeOp::Delete, EntityKind::Note, json!({ "id": id }));
        Ok(note)
    }

    /// Gets one note by id; `Ok(None)` when absent.
    pub fn get_note(&self, id: NoteId) -> Result<Option<Note>, WorkspaceError> {
        match self.store.read(&note_path(id)) {
            Ok(value) => Ok(Some(serde_json::from_value(value)?)),
            Err(StoreError::NotFound(_)) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Lists notes, optionally filtered to one folder, newest edit first
    /// with id as a stable tie-break.
    pub fn list_notes(&self, folder: Option<FolderId>) -> Result<Vec<Note>, WorkspaceError> {
        let mut notes: Vec<Note> = self
            .notes_map()?
            .into_values()
            .filter(|note| folder.is_none() || note.folder_id == folder)
            .collect();
        notes.sort_by(|a, b| {
            b.updated_at_ms
                .cmp(&a.updated_at_ms)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(notes)
    }

    /// Creates a folder appended after the current last ordering hint.
    pub fn create_folder(&self, name: impl Into<String>) -> Result<Folder, WorkspaceError> {
        let next_order = self
            .folders_map()?
            .values()
            .map(|folder| folder.sort_order + 1)
            .max()
            .unwrap_or(0);
        let folder = Folder::new(name, next_order);
        self.store
            .write(&folder_path(folder.id), serde_json::to_value(&folder)?)?;
        self.capture_offline(
            ChangeOp::Create,
            EntityKind::Folder,
            serde_json::to_value(&folder)?,
        );
        Ok(folder)
    }

    pub fn rename_folder(
        &self,
        id: FolderId,
        name: impl Into<String>,
    ) -> Result<Folder, WorkspaceError> {
        let mut folder = self.require_folder(id)?;
        folder.name = name.into();
        self.store
            .write(&folder_path(id), serde_json::to_value(&folder)?)?;
        self.capture_offline(
            ChangeOp::Update,
            EntityKind::Folder,
            serde_json::to_value(&folder)?,
        );
        Ok(folder)
    }

    /// Removes one folder: member notes are detached (their weak reference
    /// would otherwise dangle), then the folder entry is dropped and any
    /// selection pointing at it is cleared.
    pub fn delete_folder(&self, id: FolderId) -> Result<Folder, WorkspaceError> {
        let folder = self.require_folder(id)?;
        for note in self.notes_map()?.into_values() {
            if note.folder_id == Some(id) {
                self.store
                    .merge(&note_path(note.id), json!({ "folder_id": null }))?;
            }
        }
        self.store.remove(&folder_path(id))?;
        self.clear_selection_if(selected_folder_path(), id)?;
        self.capture_offline(ChangeOp::Delete, EntityKind::Folder, json!({ "id": id }));
        Ok(folder)
    }

    /// Lists folders by ordering hint, id as tie-break.
    pub fn list_folders(&self) -> Result<Vec<Folder>, WorkspaceError> {
        let mut folders: Vec<Folder> = self.folders_map()?.into_values().collect();
        folders.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then_with(|| a.id.cmp(&b.id)));
        Ok(folders)
    }

    /// Selects one note (must exist) or clears the selection.
    pub fn select_note(&self, id: Option<NoteId>) -> Result<(), WorkspaceError> {
        if let Some(id) = id {
            self.require_note(id)?;
        }
        self.store
            .write(&selected_note_path(), serde_json::to_value(id)?)?;
        Ok(())
    }

    /// Selects one folder (must exist) or clears the selection.
    pub fn select_folder(&self, id: Option<FolderId>) -> Result<(), WorkspaceError> {
        if let Some(id) = id {
            self.require_folder(id)?;
        }
        self.store
            .write(&selected_folder_path(), serde_json::to_value(id)?)?;
        Ok(())
    }

    pub fn set_theme(&self, theme: Theme) -> Result<(), WorkspaceError> {
        self.store.write(
            &StorePath::from_segments([UI_NODE, "theme"]),
            serde_json::to_value(theme)?,
        )?;
        Ok(())
    }

    pub fn set_sidebar_open(&self, open: bool) -> Result<(), WorkspaceError> {
        self.store
            .write(&StorePath::from_segments([UI_NODE, "sidebar_open"]), json!(open))?;
        Ok(())
    }

    /// Applies a partial preferences update after validation.
    pub fn update_preferences(
        &self,
        patch: PreferencesPatch,
    ) -> Result<UserPreferences, WorkspaceError> {
        if patch.font_size == Some(0) {
            return Err(WorkspaceError::InvalidPreference("font_size must be positive"));
        }
        let prefs_path = StorePath::from_segments([PREFS_NODE]);
        let mut prefs: UserPreferences = serde_json::from_value(self.store.read(&prefs_path)?)?;
        if let Some(layout) = patch.layout {
            prefs.layout = layout;
        }
        if let Some(font_size) = patch.font_size {
            prefs.font_size = font_size;
        }
        if let Some(theme) = patch.theme {
            prefs.theme = theme;
        }
        if let Some(user_id) = patch.user_id {
            prefs.user_id = user_id;
        }
        self.store.write(&prefs_path, serde_json::to_value(&prefs)?)?;
        Ok(prefs)
    }

    /// Records the signed-in user, or clears it on sign-out.
    pub fn set_user(&self, user_id: Option<String>) -> Result<UserPreferences, WorkspaceError> {
        self.update_preferences(PreferencesPatch {
            user_id: Some(user_id),
            ..Default::default()
        })
    }

    fn require_note(&self, id: NoteId) -> Result<Note, WorkspaceError> {
        self.get_note(id)?.ok_or(WorkspaceError::NoteNotFound(id))
    }

    fn require_folder(&self, id: FolderId) -> Result<Folder, WorkspaceError> {
        match self.store.read(&folder_path(id)) {
            Ok(value) => Ok(serde_json::from_value(value)?),
            Err(StoreError::NotFound(_)) => Err(WorkspaceError::FolderNotFound(id)),
            Err(err) => Err(err.into()),
        }
    }

    fn notes_map(&self) -> Result<BTreeMap<NoteId, Note>, WorkspaceError> {
        let value = self.store.read(&StorePath::from_segments([NOTES_NODE]))?;
        Ok(serde_json::from_value(value)?)
    }

    fn folders_map(&self) -> Result<BTreeMap<FolderId, Folder>, WorkspaceError> {
        let value = self.store.read(&StorePath::from_segments([FOLDERS_NODE]))?;
        Ok(serde_json::from_value(value)?)
    }

    /// Clears a weak selection reference when it points at `deleted_id`.
    fn clear_selection_if(
        &self,
        selection_path: StorePath,
        deleted_id: uuid::Uuid,
    ) -> StoreResult<()> {
        let current = self.store.read(&selection_path)?;
        if current == Value::String(deleted_id.to_string()) {
            self.store.write(&selection_path, Value::Null)?;
        }
        Ok(())
    }

    fn capture_offline(&self, op: ChangeOp, entity: EntityKind, payload: Value) {
        if self.connectivity.get() == Connectivity::Offline {
            let record: ChangeRecord = self.queue.enqueue(op, entity, payload);
            log::debug!(
                "event=offline_capture module=service op={:?} entity={:?} change_id={}",
                record.op,
                record.entity,
                record.change_id
            );
        }
    }
}

fn note_path(id: NoteId) -> StorePath {
    StorePath::from_segments([NOTES_NODE.to_string(), id.to_string()])
}

fn folder_path(id: FolderId) -> StorePath {
    StorePath::from_segments([FOLDERS_NODE.to_string(), id.to_string()])
}

fn selected_note_path() -> StorePath {
    StorePath::from_segments([UI_NODE, "selected_note_id"])
}

fn selected_folder_path() -> StorePath {
    StorePath::from_segments([UI_NODE, "selected_folder_id"])
}
