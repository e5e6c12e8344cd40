//! In-memory ledger storage for testing.

use drip_store::{LedgerStore, StoreError};
use drip_types::PositionId;
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};

/// An in-memory ledger store.
#[derive(Default)]
pub struct NullLedgerStore {
    positions: RefCell<BTreeMap<PositionId, Vec<u8>>>,
    meta: RefCell<HashMap<Vec<u8>, Vec<u8>>>,
    read_only: Cell<bool>,
}

impl NullLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position_count(&self) -> usize {
        self.positions.borrow().len()
    }

    /// Reject every subsequent write with [`StoreError::ReadOnly`].
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.set(read_only);
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.read_only.get() {
            return Err(StoreError::ReadOnly);
        }
        Ok(())
    }
}

impl LedgerStore for NullLedgerStore {
    fn put_position(&self, id: PositionId, state: &[u8]) -> Result<(), StoreError> {
        self.check_writable()?;
        self.positions.borrow_mut().insert(id, state.to_vec());
        Ok(())
    }

    fn iter_positions(&self) -> Result<Vec<(PositionId, Vec<u8>)>, StoreError> {
        Ok(self
            .positions
            .borrow()
            .iter()
            .map(|(id, bytes)| (*id, bytes.clone()))
            .collect())
    }

    fn get_meta(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.meta.borrow().get(key).cloned())
    }

    fn put_meta(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.check_writable()?;
        self.meta.borrow_mut().insert(key.to_vec(), value.to_vec());
        Ok(())
    }
}
