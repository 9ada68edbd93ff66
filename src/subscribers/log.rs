//! # LogWriter: events as `tracing` records
//!
//! A subscriber that turns every [`Event`] into a structured `tracing` record.
//! Install any `tracing` subscriber (the binary uses `tracing-subscriber` with
//! `RUST_LOG`) to see them.
//!
//! ## Levels
//! - `debug`: per-cycle traffic (tokens, observations, worker start/stop)
//! - `info`: run milestones (state changes, target reached, all stopped)
//! - `warn`: timeouts on the gate, grace exceeded, subscriber trouble

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        match e.kind {
            EventKind::ConsumerStarted => debug!(worker = e.worker, "consumer started"),
            EventKind::ConsumerStopped => {
                debug!(worker = e.worker, reason = e.reason.as_deref(), "consumer stopped")
            }
            EventKind::ProducerStarted => debug!(worker = e.worker, "producer started"),
            EventKind::ProducerStopped => {
                debug!(worker = e.worker, enqueued = e.value, "producer stopped")
            }
            EventKind::TokenEnqueued => {
                debug!(worker = e.worker, token = e.value, "token enqueued")
            }
            EventKind::EnqueueTimedOut => {
                debug!(worker = e.worker, timeout_ms = e.timeout_ms, "queue full, token abandoned")
            }
            EventKind::CounterObserved => {
                debug!(worker = e.worker, value = e.value, "counter observed")
            }
            EventKind::AcquireTimedOut => {
                warn!(worker = e.worker, timeout_ms = e.timeout_ms, "acquire timed out, cycle skipped")
            }
            EventKind::ReleaseTimedOut => {
                warn!(worker = e.worker, timeout_ms = e.timeout_ms, "release timed out")
            }
            EventKind::ReleaseRefused => {
                warn!(worker = e.worker, reason = e.reason.as_deref(), "release refused")
            }
            EventKind::TargetReached => {
                info!(worker = e.worker, value = e.value, "target reached")
            }
            EventKind::StateChanged => {
                info!(state = ?e.state, "coordinator state changed")
            }
            EventKind::ShutdownRequested => info!("shutdown requested"),
            EventKind::AllStoppedWithin => info!("all tasks stopped within grace"),
            EventKind::GraceExceeded => {
                warn!(aborted = e.value, grace_ms = e.timeout_ms, "grace exceeded, tasks aborted")
            }
            EventKind::SubscriberOverflow => {
                warn!(reason = e.reason.as_deref(), "subscriber overflow")
            }
            EventKind::BusLagged => {
                warn!(skipped = e.value, "subscriber listener lagged, events lost")
            }
            EventKind::SubscriberPanicked => {
                warn!(reason = e.reason.as_deref(), "subscriber panicked")
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
