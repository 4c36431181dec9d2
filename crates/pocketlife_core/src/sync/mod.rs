//! Replay of offline changes to a remote sink.
//!
//! # Responsibility
//! - Drain the offline queue up to a caller-chosen boundary and push each
//!   record to the remote, oldest first.
//! - Put retryable failures back at the queue head in their original order;
//!   drop non-retryable rejections after logging them.
//!
//! # See also
//! - `queue` for the drain/requeue primitives this module drives.

use crate::queue::{ChangeRecord, OfflineChangeQueue};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Remote-side rejection of one pushed change.
#[derive(Debug)]
pub struct PushRejected {
    pub reason: String,
    /// Transient failures go back to the queue; permanent ones are dropped.
    pub retryable: bool,
}

impl Display for PushRejected {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "push rejected ({}): {}",
            if self.retryable { "retryable" } else { "permanent" },
            self.reason
        )
    }
}

impl Error for PushRejected {}

/// Destination for replayed changes; implemented by the host's transport.
pub trait RemoteSink {
    fn push_change(&mut self, record: &ChangeRecord) -> Result<(), PushRejected>;
}

/// Outcome of one replay pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReplayReport {
    /// Records the remote accepted.
    pub pushed: usize,
    /// Records put back for a later attempt.
    pub requeued: usize,
    /// Permanently rejected records that were dropped.
    pub dropped: usize,
}

/// Drains every record queued at or before `up_to_ms` and pushes each to
/// `sink` in queue order.
///
/// On the first retryable rejection the pass stops and the failed record,
/// along with everything drained after it, returns to the queue head in the
/// original relative order. Non-retryable rejections are dropped and the
/// pass continues.
pub fn replay_pending<S: RemoteSink>(
    queue: &OfflineChangeQueue,
    sink: &mut S,
    up_to_ms: i64,
) -> ReplayReport {
    let drained = queue.drain(up_to_ms);
    let total = drained.len();
    let mut report = ReplayReport::default();
    let mut remaining = drained.into_iter();

    while let Some(record) = remaining.next() {
        match sink.push_change(&record) {
            Ok(()) => report.pushed += 1,
            Err(rejection) if rejection.retryable => {
                // Front-requeue in reverse so the failed record ends up first.
                let mut to_requeue: Vec<ChangeRecord> = remaining.collect();
                to_requeue.insert(0, record);
                report.requeued = to_requeue.len();
                for record in to_requeue.into_iter().rev() {
                    queue.requeue_front(record);
                }
                warn!(
                    "event=replay module=sync status=interrupted pushed={} requeued={} reason={}",
                    report.pushed, report.requeued, rejection.reason
                );
                return report;
            }
            Err(rejection) => {
                report.dropped += 1;
                warn!(
                    "event=replay module=sync status=dropped change_id={} reason={}",
                    record.change_id, rejection.reason
                );
            }
        }
    }

    info!(
        "event=replay module=sync status=ok drained={total} pushed={} dropped={}",
        report.pushed, report.dropped
    );
    report
}

#[cfg(test)]
mod tests {
    use super::{replay_pending, PushRejected, RemoteSink};
    use crate::queue::{ChangeOp, ChangeRecord, EntityKind, OfflineChangeQueue};
    use serde_json::json;
    use uuid::Uuid;

    /// Sink that rejects a chosen change id, once or always.
    struct ScriptedSink {
        accepted: Vec<Uuid>,
        reject_id: Option<Uuid>,
        retryable: bool,
    }

    impl ScriptedSink {
        fn accepting() -> Self {
            Self {
                accepted: Vec::new(),
                reject_id: None,
                retryable: false,
            }
        }
    }

    impl RemoteSink for ScriptedSink {
        fn push_change(&mut self, record: &ChangeRecord) -> Result<(), PushRejected> {
            if self.reject_id == Some(record.change_id) {
                return Err(PushRejected {
                    reason: "scripted".to_string(),
                    retryable: self.retryable,
                });
            }
            self.accepted.push(record.change_id);
            Ok(())
        }
    }

    fn seeded_queue(count: usize) -> (OfflineChangeQueue, Vec<Uuid>) {
        let queue = OfflineChangeQueue::new();
        let ids = (0..count)
            .map(|n| {
                queue
                    .enqueue(ChangeOp::Update, EntityKind::Note, json!({ "n": n }))
                    .change_id
            })
            .collect();
        (queue, ids)
    }

    #[test]
    fn replay_pushes_in_queue_order() {
        let (queue, ids) = seeded_queue(3);
        let mut sink = ScriptedSink::accepting();

        let report = replay_pending(&queue, &mut sink, i64::MAX);
        assert_eq!(report.pushed, 3);
        assert_eq!(sink.accepted, ids);
        assert!(queue.is_empty());
    }

    #[test]
    fn retryable_rejection_requeues_failed_record_and_tail_in_order() {
        let (queue, ids) = seeded_queue(3);
        let mut sink = ScriptedSink::accepting();
        sink.reject_id = Some(ids[1]);
        sink.retryable = true;

        let report = replay_pending(&queue, &mut sink, i64::MAX);
        assert_eq!(report.pushed, 1);
        assert_eq!(report.requeued, 2);

        let remaining: Vec<_> = queue.pending().iter().map(|r| r.change_id).collect();
        assert_eq!(remaining, vec![ids[1], ids[2]]);
    }

    #[test]
    fn permanent_rejection_drops_the_record_and_continues() {
        let (queue, ids) = seeded_queue(3);
        let mut sink = ScriptedSink::accepting();
        sink.reject_id = Some(ids[1]);
        sink.retryable = false;

        let report = replay_pending(&queue, &mut sink, i64::MAX);
        assert_eq!(report.pushed, 2);
        assert_eq!(report.dropped, 1);
        assert_eq!(sink.accepted, vec![ids[0], ids[2]]);
        assert!(queue.is_empty());
    }

    #[test]
    fn replay_honors_the_drain_boundary() {
        let record_at = |ts: i64| ChangeRecord {
            change_id: Uuid::new_v4(),
            op: ChangeOp::Update,
            entity: EntityKind::Note,
            payload: json!({}),
            queued_at_ms: ts,
        };
        let early = record_at(100);
        let late = record_at(200);
        let queue = OfflineChangeQueue::new();
        queue.restore(vec![early.clone(), late.clone()]);

        let mut sink = ScriptedSink::accepting();
        let report = replay_pending(&queue, &mut sink, 150);
        assert_eq!(report.pushed, 1);
        assert_eq!(sink.accepted, vec![early.change_id]);
        assert_eq!(queue.pending(), vec![late]);
    }
}
