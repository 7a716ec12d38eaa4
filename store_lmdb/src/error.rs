use marketd_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LmdbError {
    #[error("LMDB error: {0}")]
    Heed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("database schema version {found} is newer than supported version {supported}")]
    UnsupportedSchema { found: u32, supported: u32 },

    #[error("corrupted metadata: {0}")]
    Corruption(String),

    #[error("no migration from schema version {from} to {to}")]
    UnknownMigration { from: u32, to: u32 },
}

impl From<heed::Error> for LmdbError {
    fn from(e: heed::Error) -> Self {
        LmdbError::Heed(e.to_string())
    }
}

impl From<LmdbError> for StoreError {
    fn from(e: LmdbError) -> Self {
        StoreError::backend("open", "", e)
    }
}
