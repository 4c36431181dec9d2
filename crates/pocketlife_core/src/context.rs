//! Application context: owns and wires the core components.
//!
//! # Responsibility
//! - Bootstrap store, offline queue, persistence binder and workspace
//!   service in the one order that is safe (hydrate before anything can
//!   observe or write).
//! - Give the embedding host a single handle for ticking, replay and
//!   shutdown.

use crate::persist::{PersistenceAdapter, PersistenceBinder, DEFAULT_QUIET_WINDOW};
use crate::queue::OfflineChangeQueue;
use crate::service::workspace::{Connectivity, WorkspaceService};
use crate::store::ObservableStore;
use crate::sync::{replay_pending, RemoteSink, ReplayReport};
use log::info;
use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;

/// Root object the host keeps alive for the whole app session.
pub struct AppContext<A: PersistenceAdapter> {
    store: ObservableStore,
    queue: Arc<OfflineChangeQueue>,
    binder: PersistenceBinder<A>,
    connectivity: Rc<Cell<Connectivity>>,
    workspace: WorkspaceService,
}

impl<A: PersistenceAdapter> AppContext<A> {
    /// Bootstraps the full core over `adapter` with the contract quiet
    /// window. Hydration happens inside, before any subscription exists.
    pub fn bootstrap(adapter: A) -> Self {
        Self::bootstrap_with_quiet_window(adapter, DEFAULT_QUIET_WINDOW)
    }

    /// Bootstrap variant with a caller-chosen flush quiet window; tests use
    /// this to keep debounce deadlines short.
    pub fn bootstrap_with_quiet_window(adapter: A, quiet_window: std::time::Duration) -> Self {
        let store = ObservableStore::new();
        let queue = Arc::new(OfflineChangeQueue::new());
        let binder = PersistenceBinder::attach(adapter, &store, &queue, quiet_window);
        let connectivity = Rc::new(Cell::new(Connectivity::Online));
        let workspace = WorkspaceService::new(
            store.clone(),
            Arc::clone(&queue),
            Rc::clone(&connectivity),
        );
        info!(
            "event=bootstrap module=context status=ok pending_changes={}",
            queue.len()
        );
        Self {
            store,
            queue,
            binder,
            connectivity,
            workspace,
        }
    }

    pub fn store(&self) -> &ObservableStore {
        &self.store
    }

    pub fn queue(&self) -> &Arc<OfflineChangeQueue> {
        &self.queue
    }

    pub fn binder(&self) -> &PersistenceBinder<A> {
        &self.binder
    }

    pub fn workspace(&self) -> &WorkspaceService {
        &self.workspace
    }

    pub fn connectivity(&self) -> Connectivity {
        self.connectivity.get()
    }

    /// Flips the reachability judgment; offline capture in the workspace
    /// service follows it immediately.
    pub fn set_connectivity(&self, connectivity: Connectivity) {
        self.connectivity.set(connectivity);
        info!("event=connectivity module=context state={connectivity:?}");
    }

    /// Host-driven pump; call once per UI frame or coarse timer tick.
    pub fn tick(&self, now: Instant) -> bool {
        self.binder.tick(now)
    }

    /// Replays queued offline changes to `sink`, then marks durable state
    /// stale so the shrunken queue reaches disk on the next flush.
    pub fn replay<S: RemoteSink>(&self, sink: &mut S, up_to_ms: i64) -> ReplayReport {
        let report = replay_pending(&self.queue, sink, up_to_ms);
        if report.pushed > 0 || report.dropped > 0 {
            self.binder.mark_dirty();
        }
        report
    }

    /// Teardown: force-flushes pending state so the final edits survive the
    /// process exit.
    pub fn shutdown(self) {
        let flushed = self.binder.flush_now();
        info!("event=shutdown module=context flushed={flushed}");
    }
}

#[cfg(test)]
mod tests {
    use super::AppContext;
    use crate::persist::MemoryAdapter;
    use crate::service::workspace::Connectivity;

    #[test]
    fn bootstrap_starts_online_with_empty_queue() {
        let ctx = AppContext::bootstrap(MemoryAdapter::new());
        assert_eq!(ctx.connectivity(), Connectivity::Online);
        assert!(ctx.queue().is_empty());
        assert!(!ctx.binder().is_dirty());
    }

    #[test]
    fn offline_edits_reach_the_queue_through_the_context() {
        let ctx = AppContext::bootstrap(MemoryAdapter::new());
        ctx.set_connectivity(Connectivity::Offline);
        ctx.workspace().create_note("a", "b", None).unwrap();
        assert_eq!(ctx.queue().len(), 1);
        assert!(ctx.binder().is_dirty());
    }
}
