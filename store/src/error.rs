use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store is read-only")]
    ReadOnly,
}
