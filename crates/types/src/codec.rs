//! Entry points for turning engine payloads into caller types and back.
//!
//! Scalar types in [`crate::scalars`] carry their own wire rules through their
//! serde impls, so decoding a whole payload is an ordinary structured decode.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::CodecError;

/// Decodes raw payload bytes into a destination type.
///
/// # Errors
///
/// Returns [`CodecError::Structural`] if the bytes are not valid JSON or do not
/// match the shape of `T`, including malformed scalar tokens nested inside it.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    serde_json::from_slice(bytes).map_err(CodecError::Structural)
}

/// Encodes a value into payload bytes.
///
/// # Errors
///
/// Returns [`CodecError::Encode`] if `value` cannot be serialized (e.g. a map
/// with non-string keys).
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, CodecError> {
    serde_json::to_vec(value).map_err(CodecError::Encode)
}
