//! # One-shot termination broadcast.
//!
//! [`TerminationToken`] pairs a [`CancellationToken`] (observed by every task)
//! with a [`oneshot`] result channel (observed by the coordinator):
//! ```text
//! consumer k: counter crossed target ──► trigger(value)
//!                                          ├─► result_tx.send(value)  ──► Coordinator
//!                                          └─► token.cancel()         ──► every task loop
//! ```
//!
//! ## Rules
//! - Set at most once; never reset.
//! - Only the first [`trigger`](TerminationToken::trigger) delivers a value.
//! - [`cancel`](TerminationToken::cancel) stops tasks without delivering a value
//!   (used for external interruption).

use tokio::sync::{Mutex, oneshot};
use tokio_util::sync::CancellationToken;

/// One-shot broadcast telling every task that the run is over.
#[derive(Debug)]
pub struct TerminationToken {
    token: CancellationToken,
    result: Mutex<Option<oneshot::Sender<u64>>>,
}

impl TerminationToken {
    /// Creates an unset token and the receiver for the final counter value.
    pub fn new() -> (Self, oneshot::Receiver<u64>) {
        Self::with_token(CancellationToken::new())
    }

    /// Like [`new`](Self::new), but cancellation of `token` also counts as set.
    pub fn with_token(token: CancellationToken) -> (Self, oneshot::Receiver<u64>) {
        let (tx, rx) = oneshot::channel();
        let this = Self {
            token,
            result: Mutex::new(Some(tx)),
        };
        (this, rx)
    }

    /// Sets the token and reports `value`.
    ///
    /// Returns `true` only for the call that delivered the value.
    pub async fn trigger(&self, value: u64) -> bool {
        let sender = self.result.lock().await.take();
        self.token.cancel();
        match sender {
            Some(tx) => tx.send(value).is_ok(),
            None => false,
        }
    }

    /// Sets the token without reporting a value.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Returns `true` once the token is set.
    pub fn is_set(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Completes when the token is set.
    pub async fn wait(&self) {
        self.token.cancelled().await
    }

    /// Underlying cancellation token.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}
