//! # permitgate
//!
//! **permitgate** drives a shared counter through a timeout-bounded counting
//! semaphore, fed by a producer/consumer handoff.
//!
//! A fixed pool of producers pushes work tokens into a bounded queue and
//! signals; a fixed pool of consumers wakes, takes a token, acquires a permit,
//! adds the token to the counter, releases the permit and waits again. The
//! consumer that moves the counter onto the target sets a one-shot termination
//! token and every task winds down.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   ┌──────────────┐   ┌──────────────┐         ┌──────────────┐
//!   │  Producer 1  │   │  Producer 2  │   ...   │  Producer M  │
//!   └──────┬───────┘   └──────┬───────┘         └──────┬───────┘
//!          │ try_enqueue + signal                      │
//!          ▼                                           ▼
//!   ┌──────────────────────────┐        ┌──────────────────────────┐
//!   │ WorkQueue (cap = N)      │        │ WakeSignal (lossy)       │
//!   └────────────┬─────────────┘        └────────────┬─────────────┘
//!                │ dequeue                           │ wait
//!                ▼                                   ▼
//!   ┌───────────────────────────────────────────────────────────────┐
//!   │  Consumer 1 .. Consumer N                                     │
//!   │   acquire ─► SharedCounter::advance ─► Observe ─► release     │
//!   └──────┬──────────────────────────────┬─────────────────────────┘
//!          │ BoundedSemaphore (cap = C)   │ crossed target
//!          ▼                              ▼
//!   ┌──────────────┐             ┌──────────────────┐
//!   │ SharedCounter│             │ TerminationToken │ ──► Coordinator
//!   └──────────────┘             └──────────────────┘
//! ```
//!
//! Every step is published on the event [`Bus`](crate::events::Bus) and fanned
//! out to [`Subscribe`]rs: [`LogWriter`] (tracing) and [`Display`] (terminal rows).
//!
//! ## Features
//! | Area              | Description                                                     | Key types / traits                         |
//! |-------------------|-----------------------------------------------------------------|--------------------------------------------|
//! | **Gate**          | Counting semaphore with acquire and release timeouts.           | [`BoundedSemaphore`], [`Permit`]           |
//! | **Handoff**       | Bounded FIFO and one-waiter wakeups between the pools.          | [`WorkQueue`], [`WakeSignal`]              |
//! | **Coordination**  | Pools, termination, grace period, state machine.                | [`Coordinator`], [`RunState`], [`RunReport`] |
//! | **Subscriber API**| Observe counter updates and run events.                         | [`Subscribe`], [`Event`]                   |
//! | **Errors**        | Typed errors for the gate and the configuration.                | [`GateError`], [`ConfigError`]             |
//! | **Configuration** | Pool sizes, capacity, target, delays and timeouts.              | [`Config`]                                 |
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use permitgate::{Config, Coordinator, LogWriter, Subscribe};
//!
//! #[tokio::main(flavor = "multi_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut cfg = Config::default();
//!     cfg.target = 20;
//!     cfg.cycle_delay = Duration::from_millis(5);
//!     cfg.producer_interval = Duration::from_millis(5);
//!
//!     let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
//!     let report = Coordinator::builder(cfg)
//!         .with_subscribers(subs)
//!         .with_os_signals(false)
//!         .build()?
//!         .run()
//!         .await;
//!
//!     assert!(report.target_reached());
//!     assert!(report.final_value <= 20);
//!     Ok(())
//! }
//! ```

mod config;
mod core;
mod error;
mod subscribers;

pub mod events;
pub mod sync;

// ---- Public re-exports ----

pub use config::Config;
pub use crate::core::{Coordinator, CoordinatorBuilder, RunReport, RunState};
pub use error::{ConfigError, GateError, GateOp};
pub use events::{Event, EventKind};
pub use subscribers::{Display, LogWriter, Subscribe, SubscriberSet};
pub use sync::{
    Advance, BoundedSemaphore, EnqueueOutcome, Permit, SharedCounter, SignalMode,
    TerminationToken, WakeSignal, WorkQueue, WorkToken,
};
