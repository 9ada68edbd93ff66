//! # Condition-variable style wake signal.
//!
//! [`WakeSignal`] parks consumers until a producer announces work:
//! - [`WakeSignal::wait`] parks the caller in a waiter queue;
//! - [`WakeSignal::signal`] wakes at most one parked waiter;
//! - [`WakeSignal::broadcast`] wakes every parked waiter.
//!
//! ## Lost wakeups
//! In [`SignalMode::Lossy`] (the default) the signal holds no state: a signal
//! sent while nobody waits has no effect. The protocol tolerates this, since
//! the next enqueue+signal pair wakes a consumer. Because of it the counter is
//! not guaranteed to reach its target through the exact number of tokens
//! produced.
//!
//! [`SignalMode::Buffered`] remembers one pending wake for the next waiter.
//! It must be requested explicitly through [`Config::signal_mode`](crate::Config::signal_mode).
//!
//! ## Rules
//! - A waiter is woken by at most one signal.
//! - Which waiter a signal picks is unspecified.
//! - A dropped `wait` future leaves the queue without consuming a signal.

use std::collections::VecDeque;

use tokio::sync::{Mutex, oneshot};

/// Behavior of [`WakeSignal::signal`] when no waiter is parked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignalMode {
    /// The signal is dropped.
    #[default]
    Lossy,
    /// One wake is kept for the next waiter (repeated signals do not accumulate).
    Buffered,
}

#[derive(Debug, Default)]
struct State {
    waiters: VecDeque<oneshot::Sender<()>>,
    pending: bool,
}

/// Signal/wait pairing between producers and consumers.
#[derive(Debug)]
pub struct WakeSignal {
    mode: SignalMode,
    state: Mutex<State>,
}

impl WakeSignal {
    /// Creates a signal with the given mode.
    pub fn new(mode: SignalMode) -> Self {
        Self {
            mode,
            state: Mutex::new(State::default()),
        }
    }

    /// Creates a signal that drops wakes nobody is waiting for.
    pub fn lossy() -> Self {
        Self::new(SignalMode::Lossy)
    }

    /// Configured mode.
    pub fn mode(&self) -> SignalMode {
        self.mode
    }

    /// Parks until woken by [`signal`](Self::signal) or [`broadcast`](Self::broadcast).
    pub async fn wait(&self) {
        let rx = {
            let mut state = self.state.lock().await;
            if state.pending {
                state.pending = false;
                return;
            }
            let (tx, rx) = oneshot::channel();
            state.waiters.push_back(tx);
            rx
        };
        let _ = rx.await;
    }

    /// Wakes at most one parked waiter.
    ///
    /// Returns `true` if a waiter was woken. With nobody waiting the wake is
    /// dropped (lossy) or kept for the next waiter (buffered).
    pub async fn signal(&self) -> bool {
        let mut state = self.state.lock().await;
        while let Some(tx) = state.waiters.pop_front() {
            if tx.send(()).is_ok() {
                return true;
            }
        }
        if self.mode == SignalMode::Buffered {
            state.pending = true;
        }
        false
    }

    /// Wakes every parked waiter and returns how many were woken.
    pub async fn broadcast(&self) -> usize {
        let mut state = self.state.lock().await;
        state
            .waiters
            .drain(..)
            .filter_map(|tx| tx.send(()).ok())
            .count()
    }

    /// Number of waiters currently parked.
    pub async fn waiters(&self) -> usize {
        let state = self.state.lock().await;
        state.waiters.iter().filter(|tx| !tx.is_closed()).count()
    }
}

impl Default for WakeSignal {
    fn default() -> Self {
        Self::lossy()
    }
}
