//! # Producer: one writer of the work queue.
//!
//! ```text
//! loop {
//!   ├─► sleep(producer_interval)      (cancellable)
//!   ├─► WorkQueue::try_enqueue(token, enqueue_timeout)   (cancellable)
//!   │       ├─ Enqueued → TokenEnqueued, WakeSignal::signal()
//!   │       └─ TimedOut → EnqueueTimedOut, WakeSignal::signal()
//!   └─► termination set → exit
//! }
//! ```
//!
//! A full queue means every token slot is waiting for a consumer, so a timed-out
//! enqueue still signals. Without it, lost wakeups could leave a full queue
//! beside a pool of parked consumers.

use std::sync::Arc;

use tokio::{select, time};

use crate::core::context::RunContext;
use crate::events::{Event, EventKind};
use crate::sync::{EnqueueOutcome, WorkToken};

/// Producer task with a 1-based index.
pub(crate) struct Producer {
    index: usize,
    ctx: Arc<RunContext>,
}

impl Producer {
    pub fn new(index: usize, ctx: Arc<RunContext>) -> Self {
        Self { index, ctx }
    }

    /// Runs the producer loop until termination; returns how many tokens it enqueued.
    pub async fn run(self) -> u64 {
        let ctx = Arc::clone(&self.ctx);
        let term = &ctx.termination;
        let token = WorkToken::new(ctx.cfg.token_value);
        let mut enqueued = 0u64;

        ctx.bus
            .publish(Event::new(EventKind::ProducerStarted).with_worker(self.index));

        loop {
            select! {
                biased;
                _ = term.wait() => break,
                _ = time::sleep(ctx.cfg.producer_interval) => {}
            }

            let outcome = select! {
                biased;
                _ = term.wait() => break,
                outcome = ctx.queue.try_enqueue(token, ctx.cfg.enqueue_timeout) => outcome,
            };

            match outcome {
                EnqueueOutcome::Enqueued => {
                    enqueued += 1;
                    ctx.bus.publish(
                        Event::new(EventKind::TokenEnqueued)
                            .with_worker(self.index)
                            .with_value(token.value()),
                    );
                }
                EnqueueOutcome::TimedOut => {
                    ctx.bus.publish(
                        Event::new(EventKind::EnqueueTimedOut)
                            .with_worker(self.index)
                            .with_timeout(ctx.cfg.enqueue_timeout),
                    );
                }
            }
            ctx.signal.signal().await;
        }

        ctx.bus.publish(
            Event::new(EventKind::ProducerStopped)
                .with_worker(self.index)
                .with_value(enqueued),
        );
        enqueued
    }
}
