//! Runtime core: pools, termination and grace.
//!
//! The public API from this module is [`Coordinator`] (with its builder,
//! [`RunReport`] and [`RunState`]); consumers and producers are internal.
//!
//! Internal modules:
//! - [`coordinator`]: spawns pools, detects termination, waits with grace;
//! - [`consumer`]: wait → dequeue → acquire → count → release cycle;
//! - [`producer`]: enqueue + signal on a fixed interval;
//! - [`context`]: handles shared by every task of a run;
//! - [`shutdown`]: cross-platform shutdown signal handling;
//! - [`state`]: `Running → Draining → Terminated`.

mod builder;
mod consumer;
mod context;
mod coordinator;
mod producer;
mod shutdown;
mod state;

pub use builder::CoordinatorBuilder;
pub use coordinator::{Coordinator, RunReport};
pub use state::RunState;
