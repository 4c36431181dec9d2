//! Two-method byte-blob adapter boundary.
//!
//! The binder depends only on this contract; whether bytes land in SQLite,
//! a file, or a test buffer is the adapter's business.

use crate::persist::PersistResult;
use std::cell::RefCell;

/// Durable key-value byte storage for the serialized state blob.
pub trait PersistenceAdapter {
    /// Reads the stored blob; `None` when nothing was ever saved.
    fn load_all(&self) -> PersistResult<Option<Vec<u8>>>;

    /// Overwrites the stored blob.
    fn save_all(&self, bytes: &[u8]) -> PersistResult<()>;
}

impl<A: PersistenceAdapter + ?Sized> PersistenceAdapter for Box<A> {
    fn load_all(&self) -> PersistResult<Option<Vec<u8>>> {
        (**self).load_all()
    }

    fn save_all(&self, bytes: &[u8]) -> PersistResult<()> {
        (**self).save_all(bytes)
    }
}

/// In-process adapter for tests and scaffolding; bytes live until drop.
#[derive(Debug, Default)]
pub struct MemoryAdapter {
    bytes: RefCell<Option<Vec<u8>>>,
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seeds stored bytes, e.g. to simulate an existing installation.
    pub fn seeded(bytes: Vec<u8>) -> Self {
        Self {
            bytes: RefCell::new(Some(bytes)),
        }
    }
}

impl PersistenceAdapter for MemoryAdapter {
    fn load_all(&self) -> PersistResult<Option<Vec<u8>>> {
        Ok(self.bytes.borrow().clone())
    }

    fn save_all(&self, bytes: &[u8]) -> PersistResult<()> {
        *self.bytes.borrow_mut() = Some(bytes.to_vec());
        Ok(())
    }
}
