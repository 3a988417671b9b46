//! JSON payload encoding.
//!
//! Values cross the backend boundary as UTF-8 JSON bytes.

use crate::error::{CacheError, CacheResult};
use serde::{Serialize, de::DeserializeOwned};

/// Encode `value` as a JSON payload.
pub fn serialize<T: Serialize + ?Sized>(value: &T) -> CacheResult<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| CacheError::Serialization(e.to_string()))
}

/// Decode a payload; an absent payload decodes to `None`.
pub fn deserialize<T: DeserializeOwned>(payload: Option<&[u8]>) -> CacheResult<Option<T>> {
    match payload {
        Some(bytes) => serde_json::from_slice(bytes)
            .map(Some)
            .map_err(|e| CacheError::Deserialization(e.to_string())),
        None => Ok(None),
    }
}

/// Whether a payload is the encoding of a null value.
pub(crate) fn is_null(payload: &[u8]) -> bool {
    payload == b"null"
}
