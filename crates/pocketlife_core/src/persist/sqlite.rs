//! SQLite-backed snapshot blob adapter.
//!
//! # Invariants
//! - The snapshot occupies exactly one row (`slot = 1`); a save replaces it.
//! - SQL details stay inside this adapter; callers see only bytes.

use crate::db::{open_db, open_db_in_memory};
use crate::model::epoch_ms_now;
use crate::persist::{PersistenceAdapter, PersistResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// Snapshot adapter over a migrated SQLite connection.
pub struct SqliteBlobAdapter {
    conn: Connection,
}

impl SqliteBlobAdapter {
    /// Opens (and migrates) the snapshot database at `path`.
    pub fn open(path: impl AsRef<Path>) -> PersistResult<Self> {
        Ok(Self {
            conn: open_db(path)?,
        })
    }

    /// In-memory variant; contents live as long as the adapter.
    pub fn open_in_memory() -> PersistResult<Self> {
        Ok(Self {
            conn: open_db_in_memory()?,
        })
    }
}

impl PersistenceAdapter for SqliteBlobAdapter {
    fn load_all(&self) -> PersistResult<Option<Vec<u8>>> {
        let payload = self
            .conn
            .query_row(
                "SELECT payload FROM snapshots WHERE slot = 1;",
                [],
                |row| row.get::<_, Vec<u8>>(0),
            )
            .optional()?;
        Ok(payload)
    }

    fn save_all(&self, bytes: &[u8]) -> PersistResult<()> {
        self.conn.execute(
            "INSERT INTO snapshots (slot, payload, saved_at_ms)
             VALUES (1, ?1, ?2)
             ON CONFLICT(slot) DO UPDATE SET
                payload = excluded.payload,
                saved_at_ms = excluded.saved_at_ms;",
            params![bytes, epoch_ms_now()],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::SqliteBlobAdapter;
    use crate::persist::PersistenceAdapter;

    #[test]
    fn empty_database_loads_absent() {
        let adapter = SqliteBlobAdapter::open_in_memory().unwrap();
        assert!(adapter.load_all().unwrap().is_none());
    }

    #[test]
    fn second_save_replaces_first() {
        let adapter = SqliteBlobAdapter::open_in_memory().unwrap();
        adapter.save_all(b"first").unwrap();
        adapter.save_all(b"second").unwrap();
        assert_eq!(adapter.load_all().unwrap().as_deref(), Some(&b"second"[..]));
    }
}
