//! Codec error type shared by every crate that decodes engine payloads.
//!
//! [`CodecError`] covers both scalar-level failures (a malformed `BigInt`
//! token) and structural failures (a payload that does not match the shape of
//! the destination type).

use thiserror::Error;

/// Failures raised while translating between domain values and wire bytes.
#[derive(Debug, Error)]
pub enum CodecError {
    /// A `BigInt` token was not a quoted base-10 signed 64-bit integer.
    ///
    /// Produced for non-numeric tokens, unquoted tokens, and values outside
    /// the `i64` range.
    #[error("BigInt: invalid token {token}: {reason}")]
    InvalidBigInt {
        /// The offending wire token, exactly as received.
        token: String,
        /// Description of why the token was rejected.
        reason: String,
    },

    /// A payload could not be decoded into its destination type.
    #[error("could not decode payload: {0}")]
    Structural(#[source] serde_json::Error),

    /// A value could not be canonicalized into a string-keyed object.
    ///
    /// Produced by [`crate::Json::from_value`] when the input fails to
    /// serialize, or serializes to something other than a JSON object.
    #[error("could not canonicalize opaque object: {0}")]
    Canonicalize(#[source] serde_json::Error),

    /// A value could not be written out as wire bytes.
    #[error("could not encode value: {0}")]
    Encode(#[source] serde_json::Error),
}
