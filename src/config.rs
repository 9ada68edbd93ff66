//! # Runtime configuration.
//!
//! Provides [`Config`], the centralized settings for one coordinated run.
//!
//! Config is used in two ways:
//! 1. **Coordinator creation**: `Coordinator::builder(config)`
//! 2. **Gate construction**: `BoundedSemaphore::from_config(&config)` and friends
//!
//! ## Sentinel values
//! - `cycle_delay = 0s` → consumers go straight back to waiting
//! - `bus_capacity = 0` → clamped to 1

use std::time::Duration;

use crate::error::ConfigError;
use crate::sync::SignalMode;

/// Settings for a coordinated run.
///
/// ## Field semantics
/// - `consumers`: size of the consumer pool; also the work queue capacity
/// - `producers`: size of the producer pool
/// - `capacity`: number of permits in the semaphore
/// - `target`: counter value that ends the run
/// - `token_value`: contribution of each work token
/// - `cycle_delay`: pause after each consumer cycle
/// - `producer_interval`: pause between two enqueue attempts of one producer
/// - `acquire_timeout` / `release_timeout`: permit operation bounds
/// - `enqueue_timeout`: how long a producer waits for queue room
/// - `signal_mode`: lossy (default) or buffered wakeups
/// - `grace`: wait for in-flight work after termination
/// - `bus_capacity`: event bus ring buffer size
#[derive(Clone, Debug)]
pub struct Config {
    /// Number of consumer tasks.
    pub consumers: usize,

    /// Number of producer tasks.
    pub producers: usize,

    /// Semaphore capacity: how many consumers may hold the critical section at once.
    pub capacity: usize,

    /// Counter value at which the run terminates.
    pub target: u64,

    /// Amount each work token adds to the counter.
    pub token_value: u64,

    /// Sleep after every consumer cycle that reached the critical section.
    pub cycle_delay: Duration,

    /// Pause between producer iterations.
    pub producer_interval: Duration,

    /// Maximum wait for a permit.
    pub acquire_timeout: Duration,

    /// Maximum wait to hand a permit back.
    pub release_timeout: Duration,

    /// Maximum wait for room in the work queue before the token is abandoned.
    pub enqueue_timeout: Duration,

    /// Whether a signal with no waiter is dropped or kept for the next waiter.
    pub signal_mode: SignalMode,

    /// Maximum time to wait for tasks after termination before aborting them.
    pub grace: Duration,

    /// Capacity of the event bus broadcast channel.
    pub bus_capacity: usize,
}

impl Config {
    /// Checks that the configuration can drive a run.
    ///
    /// # Example
    /// ```
    /// use permitgate::{Config, ConfigError};
    ///
    /// let mut cfg = Config::default();
    /// assert!(cfg.validate().is_ok());
    ///
    /// cfg.capacity = 0;
    /// assert_eq!(cfg.validate(), Err(ConfigError::ZeroCapacity));
    /// ```
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.consumers == 0 {
            return Err(ConfigError::NoConsumers);
        }
        if self.producers == 0 {
            return Err(ConfigError::NoProducers);
        }
        if self.target == 0 {
            return Err(ConfigError::ZeroTarget);
        }
        if self.token_value == 0 {
            return Err(ConfigError::ZeroTokenValue);
        }
        Ok(())
    }

    /// Work queue capacity: one slot per consumer.
    #[inline]
    pub fn queue_capacity(&self) -> usize {
        self.consumers.max(1)
    }

    /// Returns the per-cycle delay as an `Option`.
    ///
    /// - `None` → no pause between cycles
    /// - `Some(d)` → consumers sleep `d` after each critical section
    #[inline]
    pub fn cycle_pause(&self) -> Option<Duration> {
        if self.cycle_delay == Duration::ZERO {
            None
        } else {
            Some(self.cycle_delay)
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `consumers = 20`, `producers = 15`, `capacity = 7`
    /// - `target = 1000`, `token_value = 1`
    /// - every delay and timeout `= 300ms`
    /// - `signal_mode = SignalMode::Lossy`
    /// - `grace = 2s`, `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            consumers: 20,
            producers: 15,
            capacity: 7,
            target: 1000,
            token_value: 1,
            cycle_delay: Duration::from_millis(300),
            producer_interval: Duration::from_millis(300),
            acquire_timeout: Duration::from_millis(300),
            release_timeout: Duration::from_millis(300),
            enqueue_timeout: Duration::from_millis(300),
            signal_mode: SignalMode::Lossy,
            grace: Duration::from_secs(2),
            bus_capacity: 1024,
        }
    }
}
