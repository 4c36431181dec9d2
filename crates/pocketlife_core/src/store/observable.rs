//! Observable JSON-tree store implementation.
//!
//! # Responsibility
//! - Apply replace/merge/remove mutations at dot-separated paths.
//! - Walk an explicit registry of (path, callback) entries on every write and
//!   notify each overlapping subscriber exactly once, in registration order.
//!
//! # Invariants
//! - State mutation completes before any notification fires.
//! - Writes issued from inside a callback are applied immediately and their
//!   notifications join the active single-pass cascade.
//! - A subscriber already notified within one cascade is never re-entered,
//!   which breaks same-path write cycles.

use crate::model::state::AppState;
use crate::store::{StoreError, StorePath, StoreResult};
use serde_json::Value;
use std::cell::RefCell;
use std::collections::{HashSet, VecDeque};
use std::rc::{Rc, Weak};

/// Mutation flavor carried by a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreWriteKind {
    /// Value at the path was replaced (or created under an existing parent).
    Replace,
    /// Value at the path was deep-merged.
    Merge,
    /// Entry at the path was removed.
    Remove,
}

/// Notification payload delivered to subscribers.
#[derive(Debug, Clone)]
pub struct StoreEvent {
    /// Path the mutation targeted.
    pub path: StorePath,
    /// Mutation flavor.
    pub kind: StoreWriteKind,
}

type SubscriberFn = dyn FnMut(&StoreEvent);

struct SubscriberEntry {
    id: u64,
    path: StorePath,
    callback: Rc<RefCell<SubscriberFn>>,
}

struct StoreInner {
    root: Value,
    subscribers: Vec<SubscriberEntry>,
    next_subscriber_id: u64,
    cascade_active: bool,
    pending: VecDeque<StoreEvent>,
    notified: HashSet<u64>,
}

/// Handle to the shared state tree; cloning yields another handle to the
/// same tree, not a copy.
#[derive(Clone)]
pub struct ObservableStore {
    inner: Rc<RefCell<StoreInner>>,
}

/// RAII disposer for one subscription; dropping it (or calling
/// [`Subscription::dispose`]) unregisters the callback.
pub struct Subscription {
    inner: Weak<RefCell<StoreInner>>,
    id: u64,
}

impl Subscription {
    /// Unregisters the callback now.
    pub fn dispose(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.upgrade() {
            let mut inner = inner.borrow_mut();
            let id = self.id;
            inner.subscribers.retain(|entry| entry.id != id);
        }
    }
}

impl Default for ObservableStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ObservableStore {
    /// Creates a store holding the documented default empty state.
    pub fn new() -> Self {
        let root = serde_json::to_value(AppState::default())
            .expect("default app state serializes to a JSON object");
        Self {
            inner: Rc::new(RefCell::new(StoreInner {
                root,
                subscribers: Vec::new(),
                next_subscriber_id: 0,
                cascade_active: false,
                pending: VecDeque::new(),
                notified: HashSet::new(),
            })),
        }
    }

    /// Returns the current value at `path` without side effects.
    pub fn read(&self, path: &StorePath) -> StoreResult<Value> {
        let inner = self.inner.borrow();
        resolve(&inner.root, path).cloned()
    }

    /// Replaces the value at `path`, creating the final key when its parent
    /// object already exists.
    ///
    /// A root-path write replaces the whole tree and requires an object.
    /// Failure leaves every sibling node untouched.
    pub fn write(&self, path: &StorePath, value: Value) -> StoreResult<()> {
        {
            let mut inner = self.inner.borrow_mut();
            inner.apply_replace(path, value)?;
        }
        self.dispatch(StoreEvent {
            path: path.clone(),
            kind: StoreWriteKind::Replace,
        });
        Ok(())
    }

    /// Deep-merges `value` into the existing value at `path`.
    ///
    /// Object fields merge recursively; any non-object pair replaces. The
    /// target must already exist.
    pub fn merge(&self, path: &StorePath, value: Value) -> StoreResult<()> {
        {
            let mut inner = self.inner.borrow_mut();
            inner.apply_merge(path, value)?;
        }
        self.dispatch(StoreEvent {
            path: path.clone(),
            kind: StoreWriteKind::Merge,
        });
        Ok(())
    }

    /// Removes and returns the entry at `path`. The root cannot be removed.
    pub fn remove(&self, path: &StorePath) -> StoreResult<Value> {
        let removed = {
            let mut inner = self.inner.borrow_mut();
            inner.apply_remove(path)?
        };
        self.dispatch(StoreEvent {
            path: path.clone(),
            kind: StoreWriteKind::Remove,
        });
        Ok(removed)
    }

    /// Registers `callback` for every future write whose path overlaps
    /// `path` (ancestor, equal, or descendant). Returns the disposer.
    pub fn subscribe(
        &self,
        path: StorePath,
        callback: impl FnMut(&StoreEvent) + 'static,
    ) -> Subscription {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_subscriber_id;
        inner.next_subscriber_id += 1;
        inner.subscribers.push(SubscriberEntry {
            id,
            path,
            callback: Rc::new(RefCell::new(callback)),
        });
        Subscription {
            inner: Rc::downgrade(&self.inner),
            id,
        }
    }

    /// Number of live subscriptions; diagnostic only.
    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().subscribers.len()
    }

    /// Runs one notification cascade for `event`, folding in any writes the
    /// callbacks issue. Re-entrant calls only queue their event.
    fn dispatch(&self, event: StoreEvent) {
        {
            let mut inner = self.inner.borrow_mut();
            inner.pending.push_back(event);
            if inner.cascade_active {
                return;
            }
            inner.cascade_active = true;
        }

        loop {
            let next = self.inner.borrow_mut().pending.pop_front();
            let Some(event) = next else { break };

            let targets: Vec<(u64, Rc<RefCell<SubscriberFn>>)> = {
                let inner = self.inner.borrow();
                inner
                    .subscribers
                    .iter()
                    .filter(|entry| entry.path.overlaps(&event.path))
                    .filter(|entry| !inner.notified.contains(&entry.id))
                    .map(|entry| (entry.id, Rc::clone(&entry.callback)))
                    .collect()
            };

            for (id, callback) in targets {
                let still_registered = {
                    let mut inner = self.inner.borrow_mut();
                    let live = inner.subscribers.iter().any(|entry| entry.id == id);
                    if live {
                        inner.notified.insert(id);
                    }
                    live
                };
                if !still_registered {
                    continue;
                }
                // No store borrow is held here, so the callback may freely
                // read, write, subscribe, or dispose.
                if let Ok(mut run) = callback.try_borrow_mut() {
                    run(&event);
                }
            }
        }

        let mut inner = self.inner.borrow_mut();
        inner.cascade_active = false;
        inner.notified.clear();
    }
}

impl StoreInner {
    fn apply_replace(&mut self, path: &StorePath, value: Value) -> StoreResult<()> {
        if path.is_root() {
            if !value.is_object() {
                return Err(StoreError::NotAnObject(StorePath::root()));
            }
            self.root = value;
            return Ok(());
        }
        let (last, parents) = split_last(path);
        let parent = descend_mut(&mut self.root, parents, path)?;
        let map = parent
            .as_object_mut()
            .ok_or_else(|| StoreError::NotAnObject(parent_path(path)))?;
        map.insert(last.to_string(), value);
        Ok(())
    }

    fn apply_merge(&mut self, path: &StorePath, value: Value) -> StoreResult<()> {
        let target = descend_mut(&mut self.root, path.segments(), path)?;
        deep_merge(target, value);
        Ok(())
    }

    fn apply_remove(&mut self, path: &StorePath) -> StoreResult<Value> {
        if path.is_root() {
            return Err(StoreError::InvalidPath("<root>".to_string()));
        }
        let (last, parents) = split_last(path);
        let parent = descend_mut(&mut self.root, parents, path)?;
        let map = parent
            .as_object_mut()
            .ok_or_else(|| StoreError::NotAnObject(parent_path(path)))?;
        map.remove(last)
            .ok_or_else(|| StoreError::NotFound(path.clone()))
    }
}

fn split_last(path: &StorePath) -> (&str, &[String]) {
    let segments = path.segments();
    let (last, parents) = segments
        .split_last()
        .expect("non-root path has at least one segment");
    (last.as_str(), parents)
}

fn parent_path(path: &StorePath) -> StorePath {
    let segments = path.segments();
    StorePath::from_segments(segments[..segments.len() - 1].iter().cloned())
}

fn resolve<'a>(root: &'a Value, path: &StorePath) -> StoreResult<&'a Value> {
    let mut cursor = root;
    for (depth, segment) in path.segments().iter().enumerate() {
        let map = cursor.as_object().ok_or_else(|| {
            StoreError::NotAnObject(StorePath::from_segments(
                path.segments()[..depth].iter().cloned(),
            ))
        })?;
        cursor = map.get(segment).ok_or_else(|| {
            StoreError::NotFound(StorePath::from_segments(
                path.segments()[..=depth].iter().cloned(),
            ))
        })?;
    }
    Ok(cursor)
}

fn descend_mut<'a>(
    root: &'a mut Value,
    segments: &[String],
    full: &StorePath,
) -> StoreResult<&'a mut Value> {
    let mut cursor = root;
    for (depth, segment) in segments.iter().enumerate() {
        let map = cursor.as_object_mut().ok_or_else(|| {
            StoreError::NotAnObject(StorePath::from_segments(
                full.segments()[..depth].iter().cloned(),
            ))
        })?;
        cursor = map.get_mut(segment).ok_or_else(|| {
            StoreError::NotFound(StorePath::from_segments(
                full.segments()[..=depth].iter().cloned(),
            ))
        })?;
    }
    Ok(cursor)
}

fn deep_merge(target: &mut Value, incoming: Value) {
    match (target, incoming) {
        (Value::Object(existing), Value::Object(incoming)) => {
            for (key, value) in incoming {
                match existing.get_mut(&key) {
                    Some(slot) => deep_merge(slot, value),
                    None => {
                        existing.insert(key, value);
                    }
                }
            }
        }
        (slot, incoming) => *slot = incoming,
    }
}
