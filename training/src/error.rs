use marketd_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrainingError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{operation} on '{key}' was not committed after repeated CAS conflicts")]
    NotCommitted { operation: &'static str, key: String },
}
