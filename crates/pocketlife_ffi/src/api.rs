//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose stable, use-case-level functions to Dart via FRB.
//! - Own one app context per calling thread and keep it alive between calls.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Every fallible call returns an envelope with `ok` plus a diagnostic
//!   message; errors never cross as exceptions.

use pocketlife_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    AppContext, Connectivity, MemoryAdapter, Note, NotePatch, PersistenceAdapter,
    SqliteBlobAdapter,
};
use std::cell::RefCell;
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Instant;
use uuid::Uuid;

const SNAPSHOT_DB_FILE_NAME: &str = "pocketlife_state.sqlite3";
static SNAPSHOT_DB_PATH: OnceLock<PathBuf> = OnceLock::new();

type HostContext = AppContext<Box<dyn PersistenceAdapter>>;

thread_local! {
    // The core uses Rc/RefCell internally, so each FRB worker thread gets
    // its own context over the shared snapshot database.
    static CONTEXT: RefCell<Option<HostContext>> = const { RefCell::new(None) };
}

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Sync call; may perform small file-system setup work.
/// - Idempotent for a repeated identical configuration.
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Note projection returned to the UI list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryNoteItem {
    /// Stable note id in string form.
    pub id: String,
    pub title: String,
    pub body: String,
    /// Owning folder id, when the note lives inside one.
    pub folder_id: Option<String>,
    pub updated_at_ms: i64,
    pub bookmarked: bool,
}

/// Note list envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryNoteListResponse {
    /// Notes, newest edit first (empty on failure).
    pub items: Vec<EntryNoteItem>,
    /// Human-readable response message for diagnostics.
    pub message: String,
}

/// Generic action response envelope for command flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryActionResponse {
    /// Whether the operation succeeded.
    pub ok: bool,
    /// Id of the created or affected entity.
    pub id: Option<String>,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl EntryActionResponse {
    fn success(message: impl Into<String>, id: String) -> Self {
        Self {
            ok: true,
            id: Some(id),
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            id: None,
            message: message.into(),
        }
    }
}

/// Creates a note, optionally inside an existing folder.
///
/// # FFI contract
/// - Sync call; state mutation plus deferred persistence.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn entry_create_note(
    title: String,
    body: String,
    folder_id: Option<String>,
) -> EntryActionResponse {
    let folder_id = match folder_id.map(|raw| parse_id(&raw)).transpose() {
        Ok(folder_id) => folder_id,
        Err(message) => return EntryActionResponse::failure(message),
    };
    with_context(|ctx| {
        match ctx
            .workspace()
            .create_note(title.trim(), body.as_str(), folder_id)
        {
            Ok(note) => EntryActionResponse::success("Note created.", note.id.to_string()),
            Err(err) => EntryActionResponse::failure(format!("entry_create_note failed: {err}")),
        }
    })
}

/// Applies a partial note update; `None` fields stay untouched.
///
/// # FFI contract
/// - Sync call; state mutation plus deferred persistence.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn entry_update_note(
    id: String,
    title: Option<String>,
    body: Option<String>,
    bookmarked: Option<bool>,
) -> EntryActionResponse {
    let note_id = match parse_id(&id) {
        Ok(note_id) => note_id,
        Err(message) => return EntryActionResponse::failure(message),
    };
    let patch = NotePatch {
        title,
        body,
        bookmarked,
        ..Default::default()
    };
    with_context(|ctx| match ctx.workspace().update_note(note_id, patch) {
        Ok(note) => EntryActionResponse::success("Note updated.", note.id.to_string()),
        Err(err) => EntryActionResponse::failure(format!("entry_update_note failed: {err}")),
    })
}

/// Deletes a note and clears a selection pointing at it.
///
/// # FFI contract
/// - Sync call; state mutation plus deferred persistence.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn entry_delete_note(id: String) -> EntryActionResponse {
    let note_id = match parse_id(&id) {
        Ok(note_id) => note_id,
        Err(message) => return EntryActionResponse::failure(message),
    };
    with_context(|ctx| match ctx.workspace().delete_note(note_id) {
        Ok(note) => EntryActionResponse::success("Note deleted.", note.id.to_string()),
        Err(err) => EntryActionResponse::failure(format!("entry_delete_note failed: {err}")),
    })
}

/// Lists notes, optionally restricted to one folder, newest edit first.
///
/// # FFI contract
/// - Sync call over in-memory state.
/// - Never panics; failure yields an empty list plus message.
#[flutter_rust_bridge::frb(sync)]
pub fn entry_list_notes(folder_id: Option<String>) -> EntryNoteListResponse {
    let folder_id = match folder_id.map(|raw| parse_id(&raw)).transpose() {
        Ok(folder_id) => folder_id,
        Err(message) => {
            return EntryNoteListResponse {
                items: Vec::new(),
                message,
            }
        }
    };
    with_context(|ctx| match ctx.workspace().list_notes(folder_id) {
        Ok(notes) => {
            let items: Vec<_> = notes.into_iter().map(to_entry_note_item).collect();
            let message = if items.is_empty() {
                "No notes.".to_string()
            } else {
                format!("Found {} note(s).", items.len())
            };
            EntryNoteListResponse { items, message }
        }
        Err(err) => EntryNoteListResponse {
            items: Vec::new(),
            message: format!("entry_list_notes failed: {err}"),
        },
    })
}

/// Creates a folder appended to the end of the ordering.
///
/// # FFI contract
/// - Sync call; state mutation plus deferred persistence.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn entry_create_folder(name: String) -> EntryActionResponse {
    with_context(
        |ctx| match ctx.workspace().create_folder(name.trim().to_string()) {
            Ok(folder) => EntryActionResponse::success("Folder created.", folder.id.to_string()),
            Err(err) => EntryActionResponse::failure(format!("entry_create_folder failed: {err}")),
        },
    )
}

/// Deletes a folder; member notes are detached, not deleted.
///
/// # FFI contract
/// - Sync call; state mutation plus deferred persistence.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn entry_delete_folder(id: String) -> EntryActionResponse {
    let folder_id = match parse_id(&id) {
        Ok(folder_id) => folder_id,
        Err(message) => return EntryActionResponse::failure(message),
    };
    with_context(|ctx| match ctx.workspace().delete_folder(folder_id) {
        Ok(folder) => EntryActionResponse::success("Folder deleted.", folder.id.to_string()),
        Err(err) => EntryActionResponse::failure(format!("entry_delete_folder failed: {err}")),
    })
}

/// Flips the connectivity judgment driven by the platform's reachability
/// callbacks. While offline, note and folder mutations queue for replay.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn entry_set_offline(offline: bool) {
    with_context(|ctx| {
        ctx.set_connectivity(if offline {
            Connectivity::Offline
        } else {
            Connectivity::Online
        });
    });
}

/// Number of offline changes waiting for replay.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn entry_pending_changes() -> u32 {
    with_context(|ctx| ctx.queue().len() as u32)
}

/// Host pump for deferred persistence; call on a coarse UI timer.
///
/// Returns whether a flush attempt ran.
///
/// # FFI contract
/// - Sync call; may perform one snapshot write.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn entry_tick() -> bool {
    with_context(|ctx| ctx.tick(Instant::now()))
}

/// Force-flushes pending state; call when the app is backgrounded.
///
/// Returns whether a flush attempt ran.
///
/// # FFI contract
/// - Sync call; may perform one snapshot write.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn entry_flush() -> bool {
    with_context(|ctx| ctx.binder().flush_now())
}

fn with_context<T>(f: impl FnOnce(&HostContext) -> T) -> T {
    CONTEXT.with(|slot| {
        let mut slot = slot.borrow_mut();
        f(slot.get_or_insert_with(bootstrap_context))
    })
}

fn bootstrap_context() -> HostContext {
    let db_path = resolve_snapshot_db_path();
    let adapter: Box<dyn PersistenceAdapter> = match SqliteBlobAdapter::open(&db_path) {
        Ok(adapter) => Box::new(adapter),
        Err(err) => {
            // A broken snapshot database must not take the app down; run on
            // a memory adapter and let logging carry the diagnosis.
            log::error!(
                "event=context_bootstrap module=ffi status=fallback path={} error={err}",
                db_path.display()
            );
            Box::new(MemoryAdapter::new())
        }
    };
    AppContext::bootstrap(adapter)
}

fn resolve_snapshot_db_path() -> PathBuf {
    SNAPSHOT_DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var("POCKETLIFE_DB_PATH") {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(SNAPSHOT_DB_FILE_NAME)
        })
        .clone()
}

fn parse_id(raw: &str) -> Result<Uuid, String> {
    Uuid::parse_str(raw.trim()).map_err(|err| format!("invalid id `{raw}`: {err}"))
}

fn to_entry_note_item(note: Note) -> EntryNoteItem {
    EntryNoteItem {
        id: note.id.to_string(),
        title: note.title,
        body: note.body,
        folder_id: note.folder_id.map(|id| id.to_string()),
        updated_at_ms: note.updated_at_ms,
        bookmarked: note.bookmarked,
    }
}

#[cfg(test)]
mod tests {
    use super::{
        core_version, entry_create_folder, entry_create_note, entry_delete_note, entry_flush,
        entry_list_notes, entry_pending_changes, entry_set_offline, init_logging, ping,
    };
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), String::new());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "tmp/logs".to_string());
        assert!(!error.is_empty());
    }

    #[test]
    fn created_note_appears_in_list() {
        let token = unique_token("ffi-create");
        let created = entry_create_note(token.clone(), "body".to_string(), None);
        assert!(created.ok, "{}", created.message);
        let created_id = created.id.clone().expect("create returns the note id");

        let listed = entry_list_notes(None);
        assert!(listed
            .items
            .iter()
            .any(|item| item.id == created_id && item.title == token));

        let deleted = entry_delete_note(created_id.clone());
        assert!(deleted.ok, "{}", deleted.message);
        assert!(!entry_list_notes(None)
            .items
            .iter()
            .any(|item| item.id == created_id));
    }

    #[test]
    fn create_note_rejects_malformed_folder_id() {
        let response = entry_create_note(
            "t".to_string(),
            "b".to_string(),
            Some("not-a-uuid".to_string()),
        );
        assert!(!response.ok);
        assert!(response.message.contains("invalid id"));
    }

    #[test]
    fn offline_mutations_accumulate_pending_changes() {
        entry_set_offline(true);
        let before = entry_pending_changes();
        let created = entry_create_folder(unique_token("ffi-offline"));
        assert!(created.ok, "{}", created.message);
        assert_eq!(entry_pending_changes(), before + 1);
        entry_set_offline(false);
    }

    #[test]
    fn flush_persists_after_a_mutation() {
        let created = entry_create_note(unique_token("ffi-flush"), String::new(), None);
        assert!(created.ok, "{}", created.message);
        assert!(entry_flush());
        // Nothing dirty remains, so a second flush is a no-op.
        assert!(!entry_flush());
    }

    fn unique_token(prefix: &str) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time went backwards")
            .as_nanos();
        format!("{prefix}-{nanos}")
    }
}
