//! Error type for transaction result delivery.

use thiserror::Error;
use types::CodecError;

/// Failures observed by a caller awaiting one operation's transactional result.
#[derive(Debug, Error)]
pub enum TransactionError {
    /// The batch closed this operation's channel without writing a payload.
    ///
    /// The surrounding transaction was aborted before this operation produced
    /// a result, typically because an earlier operation in the batch failed
    /// and the whole batch rolled back. Every later `get` returns this again.
    #[error("result not available: transaction was aborted before this operation completed")]
    ResultNotAvailable,

    /// The payload arrived but does not decode into the requested type.
    ///
    /// The payload stays cached; a later `get` may retry with another type.
    #[error("could not decode transaction result: {0}")]
    Decode(#[from] CodecError),
}
