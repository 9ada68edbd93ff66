//! Handles shared by every task of one run.

use std::sync::Arc;

use tokio::sync::oneshot;

use crate::config::Config;
use crate::events::Bus;
use crate::sync::{BoundedSemaphore, SharedCounter, TerminationToken, WakeSignal, WorkQueue};

/// Everything a consumer or producer touches, passed explicitly by `Arc`.
pub(crate) struct RunContext {
    pub cfg: Config,
    pub semaphore: Arc<BoundedSemaphore>,
    pub counter: Arc<SharedCounter>,
    pub queue: WorkQueue,
    pub signal: WakeSignal,
    pub termination: TerminationToken,
    pub bus: Bus,
}

impl RunContext {
    /// Builds the handles for `cfg`; the receiver gets the final counter value.
    pub fn new(cfg: Config) -> (Self, oneshot::Receiver<u64>) {
        let (termination, result_rx) = TerminationToken::new();
        let ctx = Self {
            semaphore: Arc::new(BoundedSemaphore::from_config(&cfg)),
            counter: Arc::new(SharedCounter::new()),
            queue: WorkQueue::new(cfg.queue_capacity()),
            signal: WakeSignal::new(cfg.signal_mode),
            termination,
            bus: Bus::new(cfg.bus_capacity_clamped()),
            cfg,
        };
        (ctx, result_rx)
    }
}
