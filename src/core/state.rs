//! # Coordinator state machine.
//!
//! ```text
//! Running ──(counter reached target | stop requested)──► Draining
//! Draining ──(all tasks joined or grace elapsed)───────► Terminated
//! ```
//!
//! Transitions only move forward; `Terminated` is final.

use std::fmt;

/// Lifecycle state of a [`Coordinator`](crate::Coordinator) run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RunState {
    /// Consumers and producers are active.
    Running,
    /// Termination is set; in-flight critical sections are finishing.
    Draining,
    /// Every task has stopped or was aborted.
    Terminated,
}

impl RunState {
    /// Returns `true` if `next` is a legal successor of `self`.
    pub fn can_advance_to(self, next: RunState) -> bool {
        matches!(
            (self, next),
            (RunState::Running, RunState::Draining) | (RunState::Draining, RunState::Terminated)
        )
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Running => f.write_str("running"),
            RunState::Draining => f.write_str("draining"),
            RunState::Terminated => f.write_str("terminated"),
        }
    }
}
