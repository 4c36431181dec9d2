//! Persistence binder: hydration plus debounced flush.
//!
//! # Responsibility
//! - Hydrate the store and offline queue from the adapter exactly once, at
//!   construction, and never fail startup doing it.
//! - Watch the whole store tree and persist the full snapshot after each
//!   burst of writes settles (trailing-edge debounce).
//!
//! # Invariants
//! - Hydration populates the store before the root subscription exists, so
//!   loading state never schedules a flush of itself.
//! - Flush failures stay inside this layer: the in-memory state is never
//!   rolled back and retry is lazy (the next write re-arms the timer).
//! - At most one pending flush deadline exists at any time.

use crate::persist::{DebounceTimer, PersistenceAdapter, StoreSnapshot};
use crate::queue::OfflineChangeQueue;
use crate::store::{ObservableStore, StorePath, Subscription};
use log::{error, info, warn};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Contract quiet window between the last write and the flush.
pub const DEFAULT_QUIET_WINDOW: Duration = Duration::from_millis(1000);

struct BinderShared {
    dirty: bool,
    timer: DebounceTimer,
    last_flush_failed: bool,
}

/// Bridges store mutations to the persistence adapter.
pub struct PersistenceBinder<A: PersistenceAdapter> {
    adapter: A,
    store: ObservableStore,
    queue: Arc<OfflineChangeQueue>,
    shared: Rc<RefCell<BinderShared>>,
    _root_subscription: Subscription,
}

impl<A: PersistenceAdapter> PersistenceBinder<A> {
    /// Hydrates `store` and `queue` from `adapter`, then subscribes to the
    /// store root so every future write arms the debounce timer.
    ///
    /// Hydration failures of any kind (absent blob, corrupt blob, adapter
    /// read error) leave the default state in place and are only logged.
    pub fn attach(
        adapter: A,
        store: &ObservableStore,
        queue: &Arc<OfflineChangeQueue>,
        quiet_window: Duration,
    ) -> Self {
        hydrate(&adapter, store, queue);

        let shared = Rc::new(RefCell::new(BinderShared {
            dirty: false,
            timer: DebounceTimer::new(quiet_window),
            last_flush_failed: false,
        }));
        let on_write = Rc::clone(&shared);
        let root_subscription = store.subscribe(StorePath::root(), move |_event| {
            let mut shared = on_write.borrow_mut();
            shared.dirty = true;
            shared.timer.arm(Instant::now());
        });

        Self {
            adapter,
            store: store.clone(),
            queue: Arc::clone(queue),
            shared,
            _root_subscription: root_subscription,
        }
    }

    /// Host-driven pump: flushes when the quiet window has elapsed.
    ///
    /// Returns whether a flush attempt ran. Callers never block on I/O they
    /// did not ask for; a `false` return did no work at all.
    pub fn tick(&self, now: Instant) -> bool {
        let due = {
            let shared = self.shared.borrow();
            shared.dirty && shared.timer.is_due(now)
        };
        if !due {
            return false;
        }
        self.run_flush();
        true
    }

    /// Fire-now path for process teardown: flushes pending state without
    /// waiting for the quiet window, so the last burst of edits survives.
    pub fn flush_now(&self) -> bool {
        if !self.shared.borrow().dirty {
            return false;
        }
        self.run_flush();
        true
    }

    /// Marks durable state stale outside a store write, e.g. after the sync
    /// collaborator drained the offline queue.
    pub fn mark_dirty(&self) {
        let mut shared = self.shared.borrow_mut();
        shared.dirty = true;
        shared.timer.arm(Instant::now());
    }

    /// Whether in-memory state has changes not yet persisted.
    pub fn is_dirty(&self) -> bool {
        self.shared.borrow().dirty
    }

    /// Diagnostic flag for the UI layer: the most recent flush attempt
    /// failed and will be retried on the next triggering write.
    pub fn last_flush_failed(&self) -> bool {
        self.shared.borrow().last_flush_failed
    }

    fn run_flush(&self) {
        let started_at = Instant::now();
        let outcome = StoreSnapshot::capture(&self.store, &self.queue)
            .and_then(|snapshot| snapshot.encode())
            .and_then(|bytes| {
                self.adapter.save_all(&bytes)?;
                Ok(bytes.len())
            });

        let mut shared = self.shared.borrow_mut();
        // Lazy retry either way: the timer only re-arms on the next write.
        shared.timer.cancel();
        match outcome {
            Ok(byte_count) => {
                shared.dirty = false;
                shared.last_flush_failed = false;
                info!(
                    "event=flush module=persist status=ok bytes={byte_count} duration_ms={}",
                    started_at.elapsed().as_millis()
                );
            }
            Err(err) => {
                shared.last_flush_failed = true;
                error!(
                    "event=flush module=persist status=error duration_ms={} error={err}",
                    started_at.elapsed().as_millis()
                );
            }
        }
    }
}

fn hydrate<A: PersistenceAdapter>(
    adapter: &A,
    store: &ObservableStore,
    queue: &Arc<OfflineChangeQueue>,
) {
    match adapter.load_all() {
        Ok(Some(bytes)) => match StoreSnapshot::decode(&bytes) {
            Ok(snapshot) => {
                let pending = snapshot.pending_changes.len();
                if let Err(err) = snapshot.apply(store, queue) {
                    error!("event=hydrate module=persist status=error error={err}");
                } else {
                    info!("event=hydrate module=persist status=ok pending_changes={pending}");
                }
            }
            Err(err) => {
                warn!("event=hydrate module=persist status=fallback reason=decode error={err}");
            }
        },
        Ok(None) => {
            info!("event=hydrate module=persist status=fresh");
        }
        Err(err) => {
            warn!("event=hydrate module=persist status=fallback reason=load error={err}");
        }
    }
}
