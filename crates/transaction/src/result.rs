//! Per-operation result handle for transactional batches.
//!
//! A batch executes as a single engine round trip, yet every queued operation
//! presents its own "await my result" interface. The executor holds one
//! [`ResultSender`] per operation and the caller holds the matching
//! [`TransactionResult`].

use serde::de::DeserializeOwned;
use tokio::sync::oneshot;
use tracing::debug;

use crate::TransactionError;

// ---------------------------------------------------------------------------
// Consumer side
// ---------------------------------------------------------------------------

#[derive(Debug)]
enum State {
    Pending(oneshot::Receiver<Vec<u8>>),
    Completed(Vec<u8>),
    Aborted,
}

impl State {
    fn settled(received: Option<Vec<u8>>) -> Self {
        match received {
            Some(bytes) => Self::Completed(bytes),
            None => Self::Aborted,
        }
    }
}

/// The caller's handle on one queued operation's outcome.
///
/// The first [`get`](Self::get) waits for the executor; once the handle has
/// settled, every further call decodes the cached payload without touching
/// the channel again.
#[derive(Debug)]
pub struct TransactionResult {
    state: State,
}

impl TransactionResult {
    /// Creates a connected sender / handle pair for one queued operation.
    pub fn channel() -> (ResultSender, Self) {
        let (tx, rx) = oneshot::channel();
        (
            ResultSender { tx },
            Self {
                state: State::Pending(rx),
            },
        )
    }

    /// Waits for this operation's payload and decodes it into `T`.
    ///
    /// There is no timeout; cancellation is the producer's job (dropping or
    /// aborting the sender). Dropping this future before it resolves leaves
    /// the handle pending.
    ///
    /// # Errors
    ///
    /// - [`TransactionError::ResultNotAvailable`] if the sender was closed
    ///   without a payload.
    /// - [`TransactionError::Decode`] if the payload does not decode into `T`.
    pub async fn get<T: DeserializeOwned>(&mut self) -> Result<T, TransactionError> {
        if let State::Pending(rx) = &mut self.state {
            self.state = State::settled(rx.await.ok());
        }
        self.decode_settled()
    }

    /// Synchronous variant of [`get`](Self::get) for callers outside an async
    /// runtime.
    ///
    /// # Panics
    ///
    /// Panics if called from within an asynchronous execution context while
    /// the result is still pending.
    ///
    /// # Errors
    ///
    /// Same as [`get`](Self::get).
    pub fn blocking_get<T: DeserializeOwned>(&mut self) -> Result<T, TransactionError> {
        self.state = match std::mem::replace(&mut self.state, State::Aborted) {
            State::Pending(rx) => State::settled(rx.blocking_recv().ok()),
            settled => settled,
        };
        self.decode_settled()
    }

    /// Returns `true` once a payload has been received.
    pub fn is_completed(&self) -> bool {
        matches!(self.state, State::Completed(_))
    }

    /// Returns `true` once the sender has been closed without a payload.
    pub fn is_aborted(&self) -> bool {
        matches!(self.state, State::Aborted)
    }

    fn decode_settled<T: DeserializeOwned>(&self) -> Result<T, TransactionError> {
        match &self.state {
            State::Completed(bytes) => {
                debug!(payload = %String::from_utf8_lossy(bytes), "tx result");
                Ok(types::decode(bytes)?)
            }
            State::Aborted | State::Pending(_) => Err(TransactionError::ResultNotAvailable),
        }
    }
}

// ---------------------------------------------------------------------------
// Producer side
// ---------------------------------------------------------------------------

/// The executor's write end for one queued operation.
///
/// Consumed by [`complete`](Self::complete); dropping it without completing
/// aborts the operation.
#[derive(Debug)]
pub struct ResultSender {
    tx: oneshot::Sender<Vec<u8>>,
}

impl ResultSender {
    /// Delivers this operation's payload.
    ///
    /// Returns `false` if the caller already dropped its handle.
    pub fn complete(self, payload: Vec<u8>) -> bool {
        self.tx.send(payload).is_ok()
    }

    /// Closes the channel without a payload.
    pub fn abort(self) {
        drop(self);
    }

    /// Returns `true` if the caller has dropped its handle.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Fans one batch response out to the per-operation senders, in order.
///
/// On `Ok`, the i-th payload goes to the i-th sender; senders without a
/// matching payload are aborted. On `Err`, every sender is aborted and the
/// error is handed back to the executor.
///
/// Returns the number of payloads delivered to a live handle.
///
/// # Errors
///
/// Returns the batch error unchanged.
pub fn dispatch_batch<E>(
    senders: impl IntoIterator<Item = ResultSender>,
    response: Result<Vec<Vec<u8>>, E>,
) -> Result<usize, E> {
    let payloads = match response {
        Ok(payloads) => payloads,
        Err(e) => {
            senders.into_iter().for_each(ResultSender::abort);
            return Err(e);
        }
    };

    let mut payloads = payloads.into_iter();
    let mut delivered = 0;
    for sender in senders {
        match payloads.next() {
            Some(payload) => {
                if sender.complete(payload) {
                    delivered += 1;
                } else {
                    debug!("tx result handle dropped before delivery");
                }
            }
            None => sender.abort(),
        }
    }

    let surplus = payloads.count();
    if surplus > 0 {
        debug!(surplus, "batch response carried more payloads than queued operations");
    }

    Ok(delivered)
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;
    use types::{BatchResult, BigInt};

    #[derive(Debug, Deserialize)]
    struct User {
        id: String,
    }

    #[derive(Debug, Deserialize)]
    struct Counter {
        value: BigInt,
    }

    #[tokio::test]
    async fn repeated_get_reuses_cached_payload() {
        let (tx, mut result) = TransactionResult::channel();
        assert!(tx.complete(br#"{"id":"x"}"#.to_vec()));

        let first: User = result.get().await.unwrap();
        assert_eq!(first.id, "x");
        assert!(result.is_completed());

        let second: User = result.get().await.unwrap();
        assert_eq!(second.id, "x");
    }

    #[tokio::test]
    async fn closed_without_payload_is_not_available_every_time() {
        let (tx, mut result) = TransactionResult::channel();
        tx.abort();

        for _ in 0..3 {
            let err = result.get::<User>().await.unwrap_err();
            assert!(matches!(err, TransactionError::ResultNotAvailable));
        }
        assert!(result.is_aborted());
    }

    #[tokio::test]
    async fn decode_failure_keeps_cached_payload() {
        let (tx, mut result) = TransactionResult::channel();
        tx.complete(br#"{"id":"x"}"#.to_vec());

        let err = result.get::<Counter>().await.unwrap_err();
        assert!(matches!(err, TransactionError::Decode(_)));

        let user: User = result.get().await.unwrap();
        assert_eq!(user.id, "x");
    }

    #[tokio::test]
    async fn get_waits_for_a_late_producer() {
        let (tx, mut result) = TransactionResult::channel();

        let producer = tokio::spawn(async move {
            tokio::task::yield_now().await;
            tx.complete(br#"{"count":2}"#.to_vec())
        });

        let batch: BatchResult = result.get().await.unwrap();
        assert_eq!(batch.count, 2);
        assert!(producer.await.unwrap());
    }

    #[test]
    fn blocking_get_from_plain_thread() {
        let (tx, mut result) = TransactionResult::channel();
        let producer = std::thread::spawn(move || tx.complete(br#"{"value":"42"}"#.to_vec()));

        let counter: Counter = result.blocking_get().unwrap();
        assert_eq!(counter.value.as_i64(), 42);
        assert!(producer.join().unwrap());
    }

    #[tokio::test]
    async fn dispatch_batch_delivers_each_slice_in_order() {
        let (tx_a, mut a) = TransactionResult::channel();
        let (tx_b, mut b) = TransactionResult::channel();
        let (tx_c, mut c) = TransactionResult::channel();

        let response: Result<_, &str> =
            Ok(vec![br#"{"id":"a"}"#.to_vec(), br#"{"id":"b"}"#.to_vec()]);
        let delivered = dispatch_batch([tx_a, tx_b, tx_c], response).unwrap();
        assert_eq!(delivered, 2);

        assert_eq!(a.get::<User>().await.unwrap().id, "a");
        assert_eq!(b.get::<User>().await.unwrap().id, "b");
        assert!(matches!(
            c.get::<User>().await,
            Err(TransactionError::ResultNotAvailable)
        ));
    }

    #[tokio::test]
    async fn dispatch_batch_failure_aborts_everything() {
        let (tx_a, mut a) = TransactionResult::channel();
        let (tx_b, mut b) = TransactionResult::channel();

        let err = dispatch_batch([tx_a, tx_b], Err::<Vec<Vec<u8>>, _>("unique constraint"))
            .unwrap_err();
        assert_eq!(err, "unique constraint");

        for handle in [&mut a, &mut b] {
            assert!(matches!(
                handle.get::<User>().await,
                Err(TransactionError::ResultNotAvailable)
            ));
        }
    }

    #[test]
    fn sender_sees_dropped_handle() {
        let (tx, result) = TransactionResult::channel();
        drop(result);
        assert!(tx.is_closed());
        assert!(!tx.complete(b"{}".to_vec()));
    }
}
