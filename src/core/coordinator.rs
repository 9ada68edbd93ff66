//! # Coordinator: consumer/producer pools, termination and grace.
//!
//! The [`Coordinator`] owns the gate (semaphore, counter, queue, signal,
//! termination token), the event bus and the subscriber set. It spawns the
//! fixed pools, waits for the termination condition and winds everything down.
//!
//! ## High-level architecture
//! ```text
//! Inputs:
//!   Config ──► Coordinator::builder(cfg).with_subscribers(..).build()?
//!
//! run():
//!   subscriber_listener(): Bus.subscribe() ─► SubscriberSet::emit(&Event)
//!   StateChanged(Running)
//!
//!   Consumer 1..=N ─┐                       Producer 1..=M ─┐
//!                   └─► JoinSet ◄───────────────────────────┘
//!
//!   wait for the first of:
//!     ├─ result channel: a consumer crossed the target  → final value
//!     ├─ stop token cancelled                            → ShutdownRequested
//!     └─ OS signal (if enabled)                          → ShutdownRequested
//!
//!   StateChanged(Draining)
//!     └─► TerminationToken::cancel() + WakeSignal::broadcast()
//!     └─► wait_all_with_grace(cfg.grace):
//!            ├─ Ok (all joined)  → AllStoppedWithin
//!            └─ grace elapsed    → abort_all, GraceExceeded
//!   StateChanged(Terminated)
//!   flush subscribers, return RunReport
//! ```
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use permitgate::{Config, Coordinator};
//!
//! # #[tokio::main(flavor = "multi_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut cfg = Config::default();
//! cfg.capacity = 1;
//! cfg.consumers = 2;
//! cfg.producers = 2;
//! cfg.target = 5;
//! cfg.cycle_delay = Duration::from_millis(1);
//! cfg.producer_interval = Duration::from_millis(1);
//!
//! let report = Coordinator::builder(cfg).with_os_signals(false).build()?.run().await;
//! assert_eq!(report.final_value, 5);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use tokio::{
    select,
    sync::{broadcast::error::RecvError, broadcast::error::TryRecvError, oneshot, watch},
    task::{JoinHandle, JoinSet},
    time,
};
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::core::{
    builder::CoordinatorBuilder, consumer::Consumer, context::RunContext, producer::Producer,
    shutdown, state::RunState,
};
use crate::events::{Bus, Event, EventKind};
use crate::subscribers::{Subscribe, SubscriberSet};
use crate::sync::{BoundedSemaphore, SharedCounter};

/// How a pooled task ended.
enum Finished {
    Consumer,
    Producer { enqueued: u64 },
}

/// Outcome of a coordinated run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Configured target.
    pub target: u64,
    /// Value reported on the result channel by the consumer that crossed the target.
    pub reported_value: Option<u64>,
    /// Counter value after every task stopped.
    pub final_value: u64,
    /// The run was stopped from outside before the target was reported.
    pub interrupted: bool,
    /// Every task stopped within the grace period.
    pub stopped_within_grace: bool,
    /// Tasks aborted after the grace period elapsed.
    pub aborted: usize,
    /// Tokens enqueued by producers that stopped on their own.
    pub tokens_enqueued: u64,
}

impl RunReport {
    /// Returns `true` if a consumer observed the target.
    pub fn target_reached(&self) -> bool {
        self.reported_value.is_some()
    }
}

/// Spawns and winds down the consumer and producer pools of one run.
pub struct Coordinator {
    ctx: Arc<RunContext>,
    subscribers: Vec<Arc<dyn Subscribe>>,
    result_rx: oneshot::Receiver<u64>,
    state_tx: watch::Sender<RunState>,
    os_signals: bool,
    stop: CancellationToken,
}

impl Coordinator {
    /// Returns a builder for a coordinator running `cfg`.
    pub fn builder(cfg: Config) -> CoordinatorBuilder {
        CoordinatorBuilder::new(cfg)
    }

    pub(crate) fn new_internal(
        cfg: Config,
        subscribers: Vec<Arc<dyn Subscribe>>,
        os_signals: bool,
        stop: CancellationToken,
    ) -> Self {
        let (ctx, result_rx) = RunContext::new(cfg);
        let (state_tx, _) = watch::channel(RunState::Running);
        Self {
            ctx: Arc::new(ctx),
            subscribers,
            result_rx,
            state_tx,
            os_signals,
            stop,
        }
    }

    /// Configuration of this run.
    pub fn config(&self) -> &Config {
        &self.ctx.cfg
    }

    /// Handle to the semaphore gating the counter.
    pub fn semaphore(&self) -> Arc<BoundedSemaphore> {
        Arc::clone(&self.ctx.semaphore)
    }

    /// Handle to the shared counter.
    pub fn counter(&self) -> Arc<SharedCounter> {
        Arc::clone(&self.ctx.counter)
    }

    /// Event bus of this run; receivers only see events published after they subscribe.
    pub fn bus(&self) -> Bus {
        self.ctx.bus.clone()
    }

    /// Watches the coordinator state.
    pub fn state(&self) -> watch::Receiver<RunState> {
        self.state_tx.subscribe()
    }

    /// Token that stops the run early when cancelled.
    pub fn stop_token(&self) -> CancellationToken {
        self.stop.clone()
    }

    /// Runs both pools until the target is reached or the run is stopped.
    pub async fn run(mut self) -> RunReport {
        let listener_stop = CancellationToken::new();
        let listener = self.subscriber_listener(listener_stop.clone());
        self.publish_state(RunState::Running);

        let mut set = JoinSet::new();
        self.spawn_pools(&mut set);

        let (reported_value, interrupted) = self.await_termination().await;

        self.advance_state(RunState::Draining);
        self.ctx.termination.cancel();
        self.ctx.signal.broadcast().await;

        let (stopped_within_grace, aborted, tokens_enqueued) = self.wait_all_with_grace(&mut set).await;
        self.advance_state(RunState::Terminated);

        let report = RunReport {
            target: self.ctx.cfg.target,
            reported_value,
            final_value: self.ctx.counter.get(),
            interrupted,
            stopped_within_grace,
            aborted,
            tokens_enqueued,
        };

        listener_stop.cancel();
        let _ = listener.await;
        report
    }

    /// Subscribes to the bus and forwards events to the subscriber set until `stop`.
    ///
    /// On stop, events already on the bus are drained before subscriber workers shut down.
    /// Events lost to lag are reported to the subscribers directly as `BusLagged`,
    /// since the bus is what overflowed.
    fn subscriber_listener(&mut self, stop: CancellationToken) -> JoinHandle<()> {
        let mut rx = self.ctx.bus.subscribe();
        let subscribers = std::mem::take(&mut self.subscribers);
        let bus = self.ctx.bus.clone();

        tokio::spawn(async move {
            let set = SubscriberSet::new(subscribers, bus);
            loop {
                select! {
                    biased;
                    res = rx.recv() => match res {
                        Ok(ev) => set.emit(&ev),
                        Err(RecvError::Lagged(n)) => set.emit(&Event::bus_lagged(n)),
                        Err(RecvError::Closed) => break,
                    },
                    _ = stop.cancelled() => {
                        loop {
                            match rx.try_recv() {
                                Ok(ev) => set.emit(&ev),
                                Err(TryRecvError::Lagged(n)) => set.emit(&Event::bus_lagged(n)),
                                Err(_) => break,
                            }
                        }
                        break;
                    }
                }
            }
            set.shutdown().await;
        })
    }

    /// Spawns `consumers` consumer tasks and `producers` producer tasks (1-based indices).
    fn spawn_pools(&self, set: &mut JoinSet<Finished>) {
        for index in 1..=self.ctx.cfg.consumers {
            let consumer = Consumer::new(index, Arc::clone(&self.ctx));
            set.spawn(async move {
                consumer.run().await;
                Finished::Consumer
            });
        }
        for index in 1..=self.ctx.cfg.producers {
            let producer = Producer::new(index, Arc::clone(&self.ctx));
            set.spawn(async move {
                let enqueued = producer.run().await;
                Finished::Producer { enqueued }
            });
        }
    }

    /// Waits for the final value or an external stop.
    ///
    /// Returns the reported value (if any) and whether the run was interrupted.
    async fn await_termination(&mut self) -> (Option<u64>, bool) {
        let bus = &self.ctx.bus;
        select! {
            res = &mut self.result_rx => (res.ok(), false),
            _ = self.stop.cancelled() => {
                bus.publish(Event::new(EventKind::ShutdownRequested).with_reason("stop token"));
                (None, true)
            }
            name = shutdown::shutdown_signal(self.os_signals) => {
                bus.publish(Event::new(EventKind::ShutdownRequested).with_reason(name));
                (None, true)
            }
        }
    }

    /// Waits for all tasks within the configured grace period, aborting the rest.
    ///
    /// Returns `(stopped_within_grace, aborted, tokens_enqueued)`.
    async fn wait_all_with_grace(&self, set: &mut JoinSet<Finished>) -> (bool, usize, u64) {
        let grace = self.ctx.cfg.grace;
        let mut enqueued = 0u64;

        let timed = time::timeout(grace, async {
            while let Some(res) = set.join_next().await {
                if let Ok(Finished::Producer { enqueued: n }) = res {
                    enqueued += n;
                }
            }
        })
        .await;

        match timed {
            Ok(()) => {
                self.ctx.bus.publish(Event::new(EventKind::AllStoppedWithin));
                (true, 0, enqueued)
            }
            Err(_) => {
                let aborted = set.len();
                set.abort_all();
                while set.join_next().await.is_some() {}
                self.ctx.bus.publish(
                    Event::new(EventKind::GraceExceeded)
                        .with_value(aborted as u64)
                        .with_timeout(grace),
                );
                (false, aborted, enqueued)
            }
        }
    }

    /// Moves to `next` if it is a legal successor of the current state.
    fn advance_state(&self, next: RunState) {
        let current = *self.state_tx.borrow();
        if current.can_advance_to(next) {
            self.state_tx.send_replace(next);
            self.publish_state(next);
        }
    }

    fn publish_state(&self, state: RunState) {
        self.ctx
            .bus
            .publish(Event::new(EventKind::StateChanged).with_state(state));
    }
}
