//! Gate primitives shared by consumers and producers.
//!
//! ## Contents
//! - [`BoundedSemaphore`] / [`Permit`] timeout-bounded counting semaphore
//! - [`SharedCounter`] / [`Advance`] the counter mutated under a permit
//! - [`WorkQueue`] / [`WorkToken`] bounded FIFO between producers and consumers
//! - [`WakeSignal`] / [`SignalMode`] lossy (or buffered) one-waiter wakeups
//! - [`TerminationToken`] one-shot stop broadcast with the final value
//!
//! ## Quick wiring
//! ```text
//! producer ─► WorkQueue::try_enqueue ─► WakeSignal::signal
//! consumer ─► WakeSignal::wait ─► WorkQueue::dequeue ─► BoundedSemaphore::acquire
//!          ─► SharedCounter::advance ─► BoundedSemaphore::release
//!          ─► (crossed target) TerminationToken::trigger
//! ```

mod counter;
mod queue;
mod semaphore;
mod signal;
mod termination;

pub use counter::{Advance, SharedCounter};
pub use queue::{EnqueueOutcome, WorkQueue, WorkToken};
pub use semaphore::{BoundedSemaphore, Permit};
pub use signal::{SignalMode, WakeSignal};
pub use termination::TerminationToken;
