//! Offline change queue.
//!
//! # Responsibility
//! - Accumulate an ordered, replayable log of mutations performed while the
//!   app cannot reach its remote service.
//! - Expose drain/requeue primitives for the external sync collaborator.
//!
//! # Invariants
//! - Insertion order is preserved (FIFO) and records are never mutated after
//!   append; the only recovery primitive is a front requeue that keeps the
//!   record's original timestamp.
//! - Timestamps are non-decreasing from front to back for freshly enqueued
//!   records, so a drain boundary is a contiguous front slice.
//! - Enqueue and drain exclude each other: an enqueue racing a drain lands
//!   fully before or fully after the drain boundary, never inside it.

use crate::model::epoch_ms_now;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;
use uuid::Uuid;

/// Mutation kind captured for replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeOp {
    Create,
    Update,
    Delete,
}

/// Entity kind a change targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Note,
    Folder,
}

/// One append-only log entry pending remote reconciliation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeRecord {
    /// Stable record id, assigned at enqueue.
    pub change_id: Uuid,
    /// Mutation kind.
    pub op: ChangeOp,
    /// Target entity kind.
    pub entity: EntityKind,
    /// Opaque data snapshot taken at capture time.
    pub payload: Value,
    /// Wall-clock epoch ms assigned at enqueue; orders replay and bounds
    /// [`OfflineChangeQueue::drain`].
    pub queued_at_ms: i64,
}

/// FIFO log of pending offline mutations.
///
/// The queue is the one core structure shared with a possibly-threaded sync
/// collaborator, so all access goes through a single internal mutex.
#[derive(Debug, Default)]
pub struct OfflineChangeQueue {
    records: Mutex<VecDeque<ChangeRecord>>,
}

impl OfflineChangeQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one record with a freshly assigned id and timestamp and
    /// returns a copy of it. Never rejects; bounded only by memory.
    pub fn enqueue(&self, op: ChangeOp, entity: EntityKind, payload: Value) -> ChangeRecord {
        let mut records = self.lock();
        // Clamp against the tail so same-millisecond bursts stay ordered.
        let floor = records.back().map_or(0, |record| record.queued_at_ms);
        let record = ChangeRecord {
            change_id: Uuid::new_v4(),
            op,
            entity,
            payload,
            queued_at_ms: epoch_ms_now().max(floor),
        };
        records.push_back(record.clone());
        record
    }

    /// Removes and returns every record with `queued_at_ms <= up_to_ms`, in
    /// original insertion order, atomically with respect to enqueues.
    pub fn drain(&self, up_to_ms: i64) -> Vec<ChangeRecord> {
        let mut records = self.lock();
        let mut drained = Vec::new();
        while records
            .front()
            .is_some_and(|record| record.queued_at_ms <= up_to_ms)
        {
            if let Some(record) = records.pop_front() {
                drained.push(record);
            }
        }
        drained
    }

    /// Pushes a failed record back to the queue head, keeping its original
    /// timestamp, so it replays before later-added records.
    pub fn requeue_front(&self, record: ChangeRecord) {
        self.lock().push_front(record);
    }

    /// Copies the current contents front-to-back, for snapshot capture.
    pub fn pending(&self) -> Vec<ChangeRecord> {
        self.lock().iter().cloned().collect()
    }

    /// Replaces the contents from a persisted snapshot, preserving order.
    pub fn restore(&self, records: Vec<ChangeRecord>) {
        *self.lock() = records.into();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<ChangeRecord>> {
        // A poisoned lock means a panic mid-append at worst; the log stays
        // structurally valid, so recover the guard instead of propagating.
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::{ChangeOp, EntityKind, OfflineChangeQueue};
    use serde_json::json;

    #[test]
    fn drain_returns_records_in_insertion_order() {
        let queue = OfflineChangeQueue::new();
        let a = queue.enqueue(ChangeOp::Create, EntityKind::Note, json!({"n": "a"}));
        let b = queue.enqueue(ChangeOp::Update, EntityKind::Note, json!({"n": "b"}));
        let c = queue.enqueue(ChangeOp::Delete, EntityKind::Folder, json!({"n": "c"}));

        let drained = queue.drain(i64::MAX);
        let ids: Vec<_> = drained.iter().map(|record| record.change_id).collect();
        assert_eq!(ids, vec![a.change_id, b.change_id, c.change_id]);
        assert!(queue.is_empty());
    }

    #[test]
    fn drain_respects_timestamp_boundary() {
        let queue = OfflineChangeQueue::new();
        let first = queue.enqueue(ChangeOp::Create, EntityKind::Note, json!({}));
        queue.enqueue(ChangeOp::Create, EntityKind::Note, json!({}));

        // Boundary strictly before the second record's timestamp window.
        let drained = queue.drain(first.queued_at_ms - 1);
        assert!(drained.is_empty());
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn requeued_record_replays_before_later_additions() {
        let queue = OfflineChangeQueue::new();
        queue.enqueue(ChangeOp::Create, EntityKind::Note, json!({"n": "a"}));
        let b = queue.enqueue(ChangeOp::Update, EntityKind::Note, json!({"n": "b"}));
        queue.enqueue(ChangeOp::Delete, EntityKind::Note, json!({"n": "c"}));

        let _drained = queue.drain(i64::MAX);
        queue.requeue_front(b.clone());
        let a2 = queue.enqueue(ChangeOp::Create, EntityKind::Note, json!({"n": "a2"}));
        let c2 = queue.enqueue(ChangeOp::Create, EntityKind::Note, json!({"n": "c2"}));

        let replayed = queue.drain(i64::MAX);
        let ids: Vec<_> = replayed.iter().map(|record| record.change_id).collect();
        assert_eq!(ids, vec![b.change_id, a2.change_id, c2.change_id]);
        // Requeue preserved the original timestamp.
        assert_eq!(replayed[0].queued_at_ms, b.queued_at_ms);
    }

    #[test]
    fn restore_round_trips_pending_contents() {
        let queue = OfflineChangeQueue::new();
        queue.enqueue(ChangeOp::Create, EntityKind::Folder, json!({"f": 1}));
        queue.enqueue(ChangeOp::Delete, EntityKind::Folder, json!({"f": 2}));
        let pending = queue.pending();

        let restored = OfflineChangeQueue::new();
        restored.restore(pending.clone());
        assert_eq!(restored.pending(), pending);
    }
}
