use std::fmt::Display;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend error during {operation} of '{key}': {message}")]
    Backend {
        operation: &'static str,
        key: String,
        message: String,
    },

    #[error("serialization error during {operation} of '{key}' as {type_name}: {message}")]
    Serialization {
        operation: &'static str,
        key: String,
        type_name: &'static str,
        message: String,
    },

    #[error("transaction contract violated: {0}")]
    TransactionContract(String),
}

impl StoreError {
    /// Build a [`StoreError::Backend`] from any backend-specific error.
    pub fn backend(operation: &'static str, key: impl Into<String>, err: impl Display) -> Self {
        Self::Backend {
            operation,
            key: key.into(),
            message: err.to_string(),
        }
    }

    pub fn is_backend(&self) -> bool {
        matches!(self, Self::Backend { .. })
    }

    pub fn is_serialization(&self) -> bool {
        matches!(self, Self::Serialization { .. })
    }
}
