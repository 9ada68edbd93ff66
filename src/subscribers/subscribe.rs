//! # Event subscriber trait.
//!
//! Provides [`Subscribe`] an extension point for plugging observers into a run.
//! The display collaborator is one such observer: it receives every
//! `CounterObserved` event, the `Observe(worker, value)` call of a consumer.
//!
//! Each subscriber gets:
//! - **Dedicated worker task** (runs independently)
//! - **Per-subscriber bounded queue** (capacity via [`Subscribe::queue_capacity`])
//! - **Panic isolation** (panics are caught and reported as `EventKind::SubscriberPanicked`)
//!
//! ## Rules
//! - A slow subscriber only affects its own queue; it never slows a consumer down.
//! - Queue overflow drops the event **for this subscriber only** and publishes
//!   `EventKind::SubscriberOverflow`.
//! - Events are processed sequentially (FIFO) per subscriber.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use permitgate::{Subscribe, Event, EventKind};
//!
//! struct Peak(std::sync::atomic::AtomicU64);
//!
//! #[async_trait]
//! impl Subscribe for Peak {
//!     async fn on_event(&self, ev: &Event) {
//!         if let (EventKind::CounterObserved, Some(v)) = (ev.kind, ev.value) {
//!             self.0.fetch_max(v, std::sync::atomic::Ordering::Relaxed);
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "peak" }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Event subscriber for run observability.
///
/// ### Implementation requirements
/// - Use async I/O or short synchronous writes; avoid blocking the executor.
/// - Handle errors internally; do not panic.
/// - Serialize access to any shared output device inside the subscriber.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Processes a single event.
    ///
    /// Called from a dedicated worker task, not in the publisher context.
    async fn on_event(&self, event: &Event);

    /// Returns the subscriber name used in overflow/panic events.
    ///
    /// The default uses `type_name::<Self>()`, which can be verbose - override it when possible.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Returns the preferred queue capacity for this subscriber.
    ///
    /// The runtime clamps capacity to a minimum of 1.
    ///
    /// Default: 1024.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
