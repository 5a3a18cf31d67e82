//! In-process store.

use std::sync::Mutex;

use super::{DocumentConnection, PositionStore, StoreConnection, StoreDocument};
use crate::error::StoreError;

/// Keeps the store document behind a mutex. Commits apply their staged
/// writes under the lock, so concurrent batches never interleave.
#[derive(Debug, Default)]
pub struct MemoryStore {
    document: Mutex<StoreDocument>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the committed state.
    pub fn snapshot(&self) -> Result<StoreDocument, StoreError> {
        self.document
            .lock()
            .map(|doc| doc.clone())
            .map_err(|_| StoreError::Poisoned)
    }
}

impl PositionStore for MemoryStore {
    fn connect(&self) -> Result<Box<dyn StoreConnection + '_>, StoreError> {
        let snapshot = self.snapshot()?;
        Ok(Box::new(DocumentConnection::new(snapshot, move |writes| {
            let mut doc = self.document.lock().map_err(|_| StoreError::Poisoned)?;
            doc.apply(&writes);
            Ok(())
        })))
    }
}
