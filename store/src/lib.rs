//! Typed, optimistically-concurrent storage for the marketd daemon.
//!
//! Layers, leaves first:
//! - [`AtomicStore`]: raw string-keyed byte store with per-key CAS. Backends
//!   (LMDB, in-memory for testing) implement this trait.
//! - [`PrefixedStore`]: namespaces every key under a fixed path segment.
//! - [`TypedStore`]: canonical keys and encoded values on top of a prefixed store,
//!   plus the optimistic read-modify-write loop ([`TypedStore::execute_transaction`]).
//!
//! Nothing here takes an in-process lock; all coordination goes through the
//! backend's compare-and-swap.

pub mod atomic;
pub mod codec;
pub mod error;
pub mod key;
pub mod prefixed;
pub mod transaction;
pub mod typed;

pub use atomic::AtomicStore;
pub use codec::{BincodeCodec, CodecError, JsonCodec, ValueCodec};
pub use error::StoreError;
pub use key::{decode_key, CanonicalKey, KeyEncoder};
pub use prefixed::PrefixedStore;
pub use transaction::{
    CasUpdate, RetryPolicy, TypedCasRequest, TypedKeyValue, DEFAULT_MAX_ATTEMPTS,
};
pub use typed::TypedStore;
