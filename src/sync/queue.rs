//! # Bounded FIFO of work tokens.
//!
//! [`WorkQueue`] wraps a bounded [`tokio::sync::mpsc`] channel so that many
//! producers and many consumers can share it:
//! ```text
//! producer 1 ──┐                                   ┌──► consumer 1
//! producer 2 ──┼─► try_enqueue ─► [ mpsc(cap) ] ─► dequeue ─┼──► consumer 2
//! producer M ──┘   (send_timeout)    (FIFO)   (shared rx)   └──► consumer N
//! ```
//!
//! ## Rules
//! - Length never exceeds capacity; a full queue makes `try_enqueue` wait.
//! - A token that cannot be enqueued within its timeout is abandoned, not retried.
//! - Tokens leave in the order they entered; racing producers are unordered.
//! - `dequeue` is cancel-safe: dropping it never loses a token.

use std::time::Duration;

use tokio::sync::{Mutex, mpsc};

/// Opaque unit of work carrying its contribution to the counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkToken {
    value: u64,
}

impl WorkToken {
    /// Creates a token worth `value`.
    pub fn new(value: u64) -> Self {
        Self { value }
    }

    /// Contribution of this token.
    pub fn value(&self) -> u64 {
        self.value
    }
}

impl Default for WorkToken {
    fn default() -> Self {
        Self::new(1)
    }
}

/// Outcome of [`WorkQueue::try_enqueue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// The token is in the queue.
    Enqueued,
    /// The queue stayed full for the whole timeout; the token was abandoned.
    TimedOut,
}

/// Bounded multi-producer multi-consumer queue of [`WorkToken`]s.
#[derive(Debug)]
pub struct WorkQueue {
    tx: mpsc::Sender<WorkToken>,
    rx: Mutex<mpsc::Receiver<WorkToken>>,
}

impl WorkQueue {
    /// Creates a queue with room for `capacity` tokens (min 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        Self {
            tx,
            rx: Mutex::new(rx),
        }
    }

    /// Enqueues `token`, waiting at most `timeout` for room.
    pub async fn try_enqueue(&self, token: WorkToken, timeout: Duration) -> EnqueueOutcome {
        match self.tx.send_timeout(token, timeout).await {
            Ok(()) => EnqueueOutcome::Enqueued,
            // The queue owns the receiver, so the channel is never closed.
            Err(_) => EnqueueOutcome::TimedOut,
        }
    }

    /// Removes the oldest token, waiting until one is available.
    pub async fn dequeue(&self) -> WorkToken {
        let mut rx = self.rx.lock().await;
        match rx.recv().await {
            Some(token) => token,
            // The queue owns a sender, so the channel never reports closed.
            None => std::future::pending().await,
        }
    }

    /// Number of tokens waiting.
    pub fn len(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    /// Returns `true` if no token is waiting.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of tokens.
    pub fn capacity(&self) -> usize {
        self.tx.max_capacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test]
    async fn test_fifo_order() {
        let q = WorkQueue::new(3);
        for v in 1..=3 {
            let out = q.try_enqueue(WorkToken::new(v), Duration::from_millis(10)).await;
            assert_eq!(out, EnqueueOutcome::Enqueued);
        }
        assert_eq!(q.len(), 3);
        for v in 1..=3 {
            assert_eq!(q.dequeue().await, WorkToken::new(v));
        }
        assert!(q.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_queue_abandons_after_timeout() {
        let q = WorkQueue::new(1);
        let _ = q.try_enqueue(WorkToken::default(), Duration::from_millis(10)).await;

        let started = Instant::now();
        let out = q
            .try_enqueue(WorkToken::default(), Duration::from_millis(200))
            .await;
        assert_eq!(out, EnqueueOutcome::TimedOut);
        assert!(started.elapsed() >= Duration::from_millis(200));
        assert_eq!(q.len(), 1, "length never exceeds capacity");
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_dequeue_keeps_token() {
        let q = WorkQueue::new(1);
        let pending = tokio::time::timeout(Duration::from_millis(50), q.dequeue()).await;
        assert!(pending.is_err());

        let _ = q.try_enqueue(WorkToken::new(5), Duration::from_millis(10)).await;
        assert_eq!(q.dequeue().await, WorkToken::new(5));
    }
}
