//! # Runtime events emitted by the coordinator, consumers and producers.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Worker lifecycle**: consumers and producers starting and stopping
//! - **Work flow**: tokens enqueued, abandoned, counted (`CounterObserved`)
//! - **Gate events**: permit operations that timed out
//! - **Run events**: target reached, state changes, shutdown and grace outcome
//!
//! The [`Event`] struct carries additional metadata such as timestamps, worker
//! index, counter value, timeouts and reasons.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use permitgate::{Event, EventKind};
//!
//! let ev = Event::observed(4, 17);
//!
//! assert_eq!(ev.kind, EventKind::CounterObserved);
//! assert_eq!(ev.worker, Some(4));
//! assert_eq!(ev.value, Some(17));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use crate::core::RunState;
use crate::error::{GateError, GateOp};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `reason`: subscriber name and panic message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `reason`: subscriber name and reason ("full", "closed")
    SubscriberOverflow,

    /// The subscriber listener fell behind the bus; older events were lost
    /// for every subscriber.
    ///
    /// Sets:
    /// - `value`: number of events skipped
    BusLagged,

    // === Worker lifecycle ===
    /// Consumer task entered its loop.
    ///
    /// Sets:
    /// - `worker`: consumer index (1-based)
    ConsumerStarted,

    /// Consumer task left its loop.
    ///
    /// Sets:
    /// - `worker`: consumer index
    /// - `reason`: why it stopped
    ConsumerStopped,

    /// Producer task entered its loop.
    ///
    /// Sets:
    /// - `worker`: producer index (1-based)
    ProducerStarted,

    /// Producer task left its loop.
    ///
    /// Sets:
    /// - `worker`: producer index
    /// - `value`: tokens it enqueued
    ProducerStopped,

    // === Work flow ===
    /// A producer placed a token in the queue and signalled.
    ///
    /// Sets:
    /// - `worker`: producer index
    /// - `value`: token value
    TokenEnqueued,

    /// The queue stayed full for the enqueue timeout; the token was abandoned.
    ///
    /// Sets:
    /// - `worker`: producer index
    /// - `timeout_ms`: enqueue timeout
    EnqueueTimedOut,

    /// A consumer finished a critical section (`Observe(worker, value)`).
    ///
    /// Sets:
    /// - `worker`: consumer index
    /// - `value`: counter value left by this critical section
    CounterObserved,

    // === Gate events ===
    /// A consumer gave up waiting for a permit and skipped its cycle.
    ///
    /// Sets:
    /// - `worker`: consumer index
    /// - `timeout_ms`: acquire timeout
    AcquireTimedOut,

    /// A consumer could not hand its permit back in time.
    ///
    /// Sets:
    /// - `worker`: consumer index
    /// - `timeout_ms`: release timeout
    ReleaseTimedOut,

    /// A permit was handed to a semaphore that did not issue it.
    ///
    /// Sets:
    /// - `worker`: consumer index
    /// - `reason`: error message
    ReleaseRefused,

    // === Run events ===
    /// A consumer moved the counter onto the target.
    ///
    /// Sets:
    /// - `worker`: detecting consumer index
    /// - `value`: final counter value
    TargetReached,

    /// The coordinator moved to another state.
    ///
    /// Sets:
    /// - `state`: new state
    StateChanged,

    /// Shutdown requested from outside (OS signal or stop token).
    ShutdownRequested,

    /// All tasks stopped within the grace period.
    AllStoppedWithin,

    /// Grace period exceeded; remaining tasks were aborted.
    ///
    /// Sets:
    /// - `value`: number of aborted tasks
    /// - `timeout_ms`: grace period
    GraceExceeded,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Consumer or producer index (1-based).
    pub worker: Option<usize>,
    /// Counter value, token value or count, depending on the kind.
    pub value: Option<u64>,
    /// Timeout involved, in milliseconds (compact).
    pub timeout_ms: Option<u32>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
    /// Coordinator state for `StateChanged`.
    pub state: Option<RunState>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            worker: None,
            value: None,
            timeout_ms: None,
            reason: None,
            state: None,
        }
    }

    /// Attaches a worker index.
    #[inline]
    pub fn with_worker(mut self, worker: usize) -> Self {
        self.worker = Some(worker);
        self
    }

    /// Attaches a value.
    #[inline]
    pub fn with_value(mut self, value: u64) -> Self {
        self.value = Some(value);
        self
    }

    /// Attaches a timeout duration (stored as milliseconds).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.timeout_ms = Some(ms);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a coordinator state.
    #[inline]
    pub fn with_state(mut self, state: RunState) -> Self {
        self.state = Some(state);
        self
    }

    /// Creates a `CounterObserved` event: consumer `worker` left the counter at `value`.
    #[inline]
    pub fn observed(worker: usize, value: u64) -> Self {
        Event::new(EventKind::CounterObserved)
            .with_worker(worker)
            .with_value(value)
    }

    /// Creates the gate event matching a failed permit operation.
    pub fn gate_error(worker: usize, err: &GateError) -> Self {
        let kind = match (err.op(), err.timeout()) {
            (GateOp::Acquire, _) => EventKind::AcquireTimedOut,
            (GateOp::Release, Some(_)) => EventKind::ReleaseTimedOut,
            (GateOp::Release, None) => EventKind::ReleaseRefused,
        };
        let ev = Event::new(kind)
            .with_worker(worker)
            .with_reason(err.to_string());
        match err.timeout() {
            Some(d) => ev.with_timeout(d),
            None => ev,
        }
    }

    /// Creates a bus lag event for `skipped` lost events.
    #[inline]
    pub fn bus_lagged(skipped: u64) -> Self {
        Event::new(EventKind::BusLagged).with_value(skipped)
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_reason(format!("subscriber={subscriber} info={info}"))
    }

    /// Returns `true` for `SubscriberOverflow` events.
    #[inline]
    pub fn is_subscriber_overflow(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberOverflow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_is_monotonic() {
        let a = Event::new(EventKind::ShutdownRequested);
        let b = Event::new(EventKind::ShutdownRequested);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn test_gate_timeout_maps_operation() {
        let err = GateError::Timeout {
            op: GateOp::Release,
            timeout: Duration::from_millis(300),
        };
        let ev = Event::gate_error(3, &err);
        assert_eq!(ev.kind, EventKind::ReleaseTimedOut);
        assert_eq!(ev.worker, Some(3));
        assert_eq!(ev.timeout_ms, Some(300));
    }

    #[test]
    fn test_overflow_is_recognised() {
        assert!(Event::subscriber_overflow("log", "full").is_subscriber_overflow());
        assert!(!Event::bus_lagged(3).is_subscriber_overflow());
    }

    #[test]
    fn test_foreign_permit_maps_to_refusal() {
        let ev = Event::gate_error(2, &GateError::ForeignPermit);
        assert_eq!(ev.kind, EventKind::ReleaseRefused);
        assert_eq!(ev.timeout_ms, None);
    }

    #[test]
    fn test_timeout_saturates() {
        let ev = Event::new(EventKind::GraceExceeded).with_timeout(Duration::from_secs(u64::MAX));
        assert_eq!(ev.timeout_ms, Some(u32::MAX));
    }
}
