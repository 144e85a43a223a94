//! Result delivery for operations queued in a transactional batch.
//!
//! Each queued operation receives a private [`TransactionResult`]. The
//! transaction executor fans one engine response out into per-operation
//! writes via [`ResultSender`] (or [`dispatch_batch`]), and each caller decodes
//! its own payload through the scalar codec in the [`types`] crate.
//!
//! ## States
//!
//! | State | Reached when | `get` returns |
//! |-------|--------------|---------------|
//! | Pending | handle created | waits |
//! | Completed | sender wrote a payload | decoded payload (cached) |
//! | Aborted | sender closed without a payload | [`TransactionError::ResultNotAvailable`] |

pub mod errors;
pub mod result;

pub use errors::TransactionError;
pub use result::{dispatch_batch, ResultSender, TransactionResult};
