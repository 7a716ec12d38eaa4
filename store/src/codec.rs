//! Value encodings for typed stores.
//!
//! CAS compares encoded bytes, so a codec must be deterministic: equal values
//! must always encode to equal bytes.

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("{0}")]
pub struct CodecError(String);

/// Converts values of type `V` to and from stored bytes.
pub trait ValueCodec<V>: Send + Sync {
    fn encode(&self, value: &V) -> Result<Vec<u8>, CodecError>;
    fn decode(&self, bytes: &[u8]) -> Result<V, CodecError>;
}

/// Compact binary encoding via `bincode`. The default for every store.
#[derive(Clone, Copy, Debug, Default)]
pub struct BincodeCodec;

impl<V: Serialize + DeserializeOwned> ValueCodec<V> for BincodeCodec {
    fn encode(&self, value: &V) -> Result<Vec<u8>, CodecError> {
        bincode::serialize(value).map_err(|e| CodecError(e.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<V, CodecError> {
        bincode::deserialize(bytes).map_err(|e| CodecError(e.to_string()))
    }
}

/// JSON encoding, for stores that should stay readable with external tools.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonCodec;

impl<V: Serialize + DeserializeOwned> ValueCodec<V> for JsonCodec {
    fn encode(&self, value: &V) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(value).map_err(|e| CodecError(e.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<V, CodecError> {
        serde_json::from_slice(bytes).map_err(|e| CodecError(e.to_string()))
    }
}
