//! Error types used by the gate primitives and the coordinator.
//!
//! This module defines two error enums:
//!
//! - [`GateError`]: a permit operation did not complete in time, or a permit
//!   was handed to a semaphore that did not issue it.
//! - [`ConfigError`]: the runtime configuration cannot be used to start a run.
//!
//! Both types provide `as_label` for logs and [`GateError`] additionally exposes
//! the operation and timeout that were involved.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Semaphore operation that can time out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOp {
    /// Reserving a permit.
    Acquire,
    /// Returning a permit.
    Release,
}

impl fmt::Display for GateOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GateOp::Acquire => f.write_str("acquire"),
            GateOp::Release => f.write_str("release"),
        }
    }
}

/// # Errors produced by [`BoundedSemaphore`](crate::BoundedSemaphore).
///
/// A timeout is never fatal: callers abandon the current cycle and try again
/// on their next scheduled iteration.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GateError {
    /// The operation could not complete within its configured timeout.
    #[error("{op} timed out after {timeout:?}")]
    Timeout {
        /// Which side of the semaphore timed out.
        op: GateOp,
        /// The timeout duration that was exceeded.
        timeout: Duration,
    },

    /// The permit was issued by a different semaphore; nothing was released.
    #[error("release refused: permit belongs to another semaphore")]
    ForeignPermit,
}

impl GateError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use permitgate::{GateError, GateOp};
    /// use std::time::Duration;
    ///
    /// let err = GateError::Timeout { op: GateOp::Acquire, timeout: Duration::from_millis(300) };
    /// assert_eq!(err.as_label(), "acquire_timeout");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            GateError::Timeout {
                op: GateOp::Acquire,
                ..
            } => "acquire_timeout",
            GateError::Timeout {
                op: GateOp::Release,
                ..
            } => "release_timeout",
            GateError::ForeignPermit => "foreign_permit",
        }
    }

    /// Returns the timeout that was exceeded, if the error is a timeout.
    pub fn timeout(&self) -> Option<Duration> {
        match self {
            GateError::Timeout { timeout, .. } => Some(*timeout),
            GateError::ForeignPermit => None,
        }
    }

    /// Returns the operation that failed.
    pub fn op(&self) -> GateOp {
        match self {
            GateError::Timeout { op, .. } => *op,
            GateError::ForeignPermit => GateOp::Release,
        }
    }
}

/// # Errors produced by [`Config::validate`](crate::Config::validate).
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The semaphore must admit at least one holder.
    #[error("semaphore capacity must be positive")]
    ZeroCapacity,

    /// At least one consumer is needed to drain the queue.
    #[error("consumer pool must not be empty")]
    NoConsumers,

    /// At least one producer is needed to feed the queue.
    #[error("producer pool must not be empty")]
    NoProducers,

    /// A zero target would terminate before any work happens.
    #[error("target counter value must be positive")]
    ZeroTarget,

    /// Tokens must move the counter.
    #[error("token value must be positive")]
    ZeroTokenValue,
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::ZeroCapacity => "config_zero_capacity",
            ConfigError::NoConsumers => "config_no_consumers",
            ConfigError::NoProducers => "config_no_producers",
            ConfigError::ZeroTarget => "config_zero_target",
            ConfigError::ZeroTokenValue => "config_zero_token_value",
        }
    }
}
