//! Domain model for PocketLife state.
//!
//! # Responsibility
//! - Define the canonical records held by the observable store.
//! - Keep serialization shapes stable for snapshot persistence.
//!
//! # Invariants
//! - Every entity is identified by a stable UUID that is never reused.
//! - Deletion removes the entry from its mapping; there is no tombstone.

pub mod note;
pub mod prefs;
pub mod state;
pub mod ui;

use std::time::{SystemTime, UNIX_EPOCH};

/// Returns the current wall-clock time in epoch milliseconds.
///
/// A clock before the Unix epoch yields `0` rather than failing; timestamps
/// here order replay and display, they are never used as identity.
pub fn epoch_ms_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::epoch_ms_now;

    #[test]
    fn epoch_ms_is_monotonic_enough_for_ordering() {
        let first = epoch_ms_now();
        let second = epoch_ms_now();
        assert!(second >= first);
        assert!(first > 0);
    }
}
