//! Local-first core for PocketLife.
//!
//! Owns the observable state tree, its durable snapshot persistence and the
//! offline change queue; the mobile shell talks to it through `AppContext`
//! and the workspace service.

pub mod context;
pub mod db;
pub mod logging;
pub mod model;
pub mod persist;
pub mod queue;
pub mod service;
pub mod store;
pub mod sync;

pub use context::AppContext;
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::note::{Folder, FolderId, Note, NoteId};
pub use model::state::AppState;
pub use persist::{
    MemoryAdapter, PersistenceAdapter, PersistenceBinder, SqliteBlobAdapter, DEFAULT_QUIET_WINDOW,
};
pub use queue::{ChangeOp, ChangeRecord, EntityKind, OfflineChangeQueue};
pub use service::workspace::{
    Connectivity, NotePatch, PreferencesPatch, WorkspaceError, WorkspaceService,
};
pub use store::{ObservableStore, StoreError, StoreEvent, StorePath, Subscription};
pub use sync::{replay_pending, PushRejected, RemoteSink, ReplayReport};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
