//! LMDB storage backend for the marketd daemon.
//!
//! Implements [`marketd_store::AtomicStore`] using the `heed` LMDB bindings.
//! All record families share one LMDB database; they are kept apart by key
//! prefixes at the layer above. A second database holds bookkeeping such as
//! the schema version.

pub mod atomic;
pub mod environment;
pub mod error;
pub mod migration;

pub use atomic::LmdbAtomicStore;
pub use environment::LmdbEnvironment;
pub use error::LmdbError;
