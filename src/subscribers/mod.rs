//! # Event subscribers.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`] fan-out,
//! and the built-in subscribers for events broadcast through the
//! [`Bus`](crate::events::Bus).
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   Consumer ── publish(Event) ──► Bus ──► listener ──► SubscriberSet::emit(&Event)
//!                                                            │
//!                                              ┌─────────────┼─────────────┐
//!                                              ▼             ▼             ▼
//!                                          LogWriter      Display       Custom
//!                                          (tracing)   (ANSI rows)
//! ```
//!
//! ## Built-in subscribers
//! - [`LogWriter`] structured `tracing` records for every event
//! - [`Display`] the terminal collaborator drawing one row per consumer

mod display;
mod log;
mod set;
mod subscribe;

pub use display::Display;
pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
