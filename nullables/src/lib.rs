//! Nullable infrastructure for deterministic testing.
//!
//! The storage layer talks to its backend only through
//! [`marketd_store::AtomicStore`]. This crate provides an implementation that:
//! - Keeps everything in memory and never touches the filesystem
//! - Can be told to fail or to lose CAS races on demand
//! - Counts the writes it accepts, so tests can prove a no-op wrote nothing
//!
//! Usage: swap the LMDB store for a [`NullAtomicStore`] in tests.

pub mod store;

pub use store::NullAtomicStore;
