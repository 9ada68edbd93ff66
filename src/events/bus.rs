//! # Broadcast bus carrying run events.
//!
//! Consumers, producers and the coordinator all hold a clone of the same
//! [`Bus`]. The coordinator keeps one receiver and forwards every event to the
//! [`SubscriberSet`](crate::SubscriberSet):
//! ```text
//!   Consumer 1..N ──┐
//!   Producer 1..M ──┼──► Bus ──► Coordinator listener ──► SubscriberSet
//!   Coordinator   ──┘   (ring buffer of `capacity` events)
//! ```
//!
//! ## Rules
//! - `publish` never waits; a gate cycle is never slowed down by observers.
//! - The ring buffer is shared by all receivers. A receiver that falls more
//!   than `capacity` events behind gets `RecvError::Lagged(n)` and loses the
//!   `n` oldest events.
//! - Events published while nobody is subscribed are gone.

use tokio::sync::broadcast;

use super::event::Event;

/// Cloneable sender side of the event channel.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a bus buffering up to `capacity` events (at least 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Sends `ev` to every current receiver.
    pub fn publish(&self, ev: Event) {
        // No receivers is not an error for a run.
        let _ = self.tx.send(ev);
    }

    /// Opens a receiver for events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    /// Number of open receivers.
    pub fn receivers(&self) -> usize {
        self.tx.receiver_count()
    }
}
