use crate::StoreError;
use drip_types::PositionId;

/// Store trait for persisting reward ledger state to durable storage.
///
/// Uses opaque `Vec<u8>` so the store doesn't depend on the `drip-accrual` crate.
/// The ledger serializes/deserializes its own types.
pub trait LedgerStore {
    fn put_position(&self, id: PositionId, state: &[u8]) -> Result<(), StoreError>;
    fn iter_positions(&self) -> Result<Vec<(PositionId, Vec<u8>)>, StoreError>;

    fn get_meta(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;
    fn put_meta(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError>;
}
