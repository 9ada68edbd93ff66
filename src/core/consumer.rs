//! # Consumer: one reader of the work queue.
//!
//! Each consumer repeats the same cycle until the termination token is set:
//! ```text
//! loop {
//!   ├─► termination set?                 → exit
//!   ├─► WakeSignal::wait()               (cancellable)
//!   ├─► WorkQueue::dequeue()             (cancellable)
//!   ├─► BoundedSemaphore::acquire()
//!   │       └─ Timeout → AcquireTimedOut, token dropped, next cycle
//!   ├─► SharedCounter::advance()         (target checked under the permit)
//!   │       ├─ Advanced       → publish CounterObserved
//!   │       └─ AlreadyReached → nothing added
//!   ├─► BoundedSemaphore::release()
//!   │       └─ Timeout → ReleaseTimedOut (non-fatal)
//!   ├─► crossed target? → TerminationToken::trigger, TargetReached, exit
//!   ├─► already reached? → exit
//!   └─► sleep(cycle_delay)               (cancellable)
//! }
//! ```
//!
//! ## Rules
//! - Acquire, mutation and release of one cycle are never interrupted.
//! - Waiting for a signal, a token or the cycle pause is raced against termination,
//!   and termination wins when both are ready: no cycle starts once it is set.

use std::sync::Arc;

use tokio::{select, time};

use crate::core::context::RunContext;
use crate::events::{Event, EventKind};
use crate::sync::{Advance, WorkToken};

/// What one critical section ended with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cycle {
    /// The token was counted; keep going.
    Counted,
    /// The permit could not be acquired; skip to the next cycle.
    Skipped,
    /// The target is reached; stop.
    Finished,
}

/// Consumer task with a 1-based index.
pub(crate) struct Consumer {
    index: usize,
    ctx: Arc<RunContext>,
}

impl Consumer {
    pub fn new(index: usize, ctx: Arc<RunContext>) -> Self {
        Self { index, ctx }
    }

    /// Runs the consumer loop until termination.
    pub async fn run(self) {
        let ctx = Arc::clone(&self.ctx);
        let term = &ctx.termination;
        ctx.bus
            .publish(Event::new(EventKind::ConsumerStarted).with_worker(self.index));

        let reason = loop {
            if term.is_set() {
                break "terminated";
            }
            select! {
                biased;
                _ = term.wait() => break "terminated",
                _ = ctx.signal.wait() => {}
            }
            let token = select! {
                biased;
                _ = term.wait() => break "terminated",
                token = ctx.queue.dequeue() => token,
            };

            match self.cycle(token).await {
                Cycle::Counted => {}
                Cycle::Skipped => continue,
                Cycle::Finished => break "target reached",
            }

            if let Some(pause) = ctx.cfg.cycle_pause() {
                select! {
                    biased;
                    _ = term.wait() => break "terminated",
                    _ = time::sleep(pause) => {}
                }
            }
        };

        ctx.bus.publish(
            Event::new(EventKind::ConsumerStopped)
                .with_worker(self.index)
                .with_reason(reason),
        );
    }

    /// One critical section: acquire, count `token`, observe, release.
    async fn cycle(&self, token: WorkToken) -> Cycle {
        let ctx = &self.ctx;
        let target = ctx.cfg.target;

        let permit = match ctx.semaphore.acquire().await {
            Ok(permit) => permit,
            Err(e) => {
                ctx.bus.publish(Event::gate_error(self.index, &e));
                return Cycle::Skipped;
            }
        };

        let advance = ctx.counter.advance(&permit, token.value(), target);
        if let Advance::Advanced { after, .. } = advance {
            ctx.bus.publish(Event::observed(self.index, after));
        }

        if let Err(e) = ctx.semaphore.release(permit).await {
            ctx.bus.publish(Event::gate_error(self.index, &e));
        }

        match advance {
            Advance::AlreadyReached(_) => Cycle::Finished,
            reached if reached.crossed(target) => {
                let value = reached.value();
                if ctx.termination.trigger(value).await {
                    ctx.bus.publish(
                        Event::new(EventKind::TargetReached)
                            .with_worker(self.index)
                            .with_value(value),
                    );
                }
                Cycle::Finished
            }
            Advance::Advanced { .. } => Cycle::Counted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::oneshot;

    use crate::config::Config;
    use crate::sync::SignalMode;

    fn context(target: u64) -> (Arc<RunContext>, oneshot::Receiver<u64>) {
        let cfg = Config {
            consumers: 2,
            capacity: 1,
            target,
            cycle_delay: Duration::ZERO,
            acquire_timeout: Duration::from_millis(50),
            release_timeout: Duration::from_millis(50),
            signal_mode: SignalMode::Buffered,
            ..Config::default()
        };
        let (ctx, rx) = RunContext::new(cfg);
        (Arc::new(ctx), rx)
    }

    fn observed(rx: &mut tokio::sync::broadcast::Receiver<Event>) -> Vec<u64> {
        let mut values = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            if ev.kind == EventKind::CounterObserved {
                values.extend(ev.value);
            }
        }
        values
    }

    #[tokio::test]
    async fn test_reached_counter_is_left_alone() {
        let (ctx, mut result) = context(2);
        let mut events = ctx.bus.subscribe();
        let consumer = Consumer::new(1, Arc::clone(&ctx));

        assert_eq!(consumer.cycle(WorkToken::new(1)).await, Cycle::Counted);
        assert_eq!(consumer.cycle(WorkToken::new(1)).await, Cycle::Finished);
        assert_eq!(consumer.cycle(WorkToken::new(1)).await, Cycle::Finished);

        assert_eq!(ctx.counter.get(), 2);
        assert_eq!(ctx.semaphore.in_use(), 0);
        assert_eq!(observed(&mut events), vec![1, 2]);
        assert_eq!(result.try_recv(), Ok(2));
    }

    #[tokio::test]
    async fn test_set_token_stops_before_next_cycle() {
        let (ctx, _result) = context(10);
        let mut events = ctx.bus.subscribe();
        assert!(ctx.termination.trigger(0).await);

        let out = ctx
            .queue
            .try_enqueue(WorkToken::new(1), Duration::from_millis(10))
            .await;
        assert_eq!(out, crate::sync::EnqueueOutcome::Enqueued);
        ctx.signal.signal().await;

        Consumer::new(1, Arc::clone(&ctx)).run().await;

        assert_eq!(ctx.counter.get(), 0);
        assert_eq!(ctx.queue.len(), 1, "the token is never taken");
        assert!(observed(&mut events).is_empty());
    }

    #[tokio::test]
    async fn test_parked_consumer_woken_after_termination_leaves() {
        let (ctx, _result) = context(10);
        let mut events = ctx.bus.subscribe();
        let handle = tokio::spawn(Consumer::new(1, Arc::clone(&ctx)).run());
        while ctx.signal.waiters().await < 1 {
            tokio::task::yield_now().await;
        }

        assert!(ctx.termination.trigger(0).await);
        let _ = ctx
            .queue
            .try_enqueue(WorkToken::new(1), Duration::from_millis(10))
            .await;
        ctx.signal.signal().await;
        handle.await.unwrap();

        assert_eq!(ctx.counter.get(), 0);
        assert_eq!(ctx.queue.len(), 1);
        let reasons: Vec<_> = std::iter::from_fn(|| events.try_recv().ok())
            .filter(|ev| ev.kind == EventKind::ConsumerStopped)
            .filter_map(|ev| ev.reason)
            .collect();
        assert_eq!(reasons.len(), 1);
        assert_eq!(&*reasons[0], "terminated");
    }
}
