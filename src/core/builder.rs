use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::{config::Config, error::ConfigError, subscribers::Subscribe};

use super::coordinator::Coordinator;

/// Builder for constructing a [`Coordinator`] with optional features.
pub struct CoordinatorBuilder {
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
    os_signals: bool,
    stop: Option<CancellationToken>,
}

impl CoordinatorBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
            os_signals: true,
            stop: None,
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive run events (observations, timeouts, state changes)
    /// through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Adds one subscriber.
    pub fn with_subscriber(mut self, subscriber: Arc<dyn Subscribe>) -> Self {
        self.subscribers.push(subscriber);
        self
    }

    /// Enables or disables termination on SIGINT/SIGTERM/SIGQUIT (Ctrl-C elsewhere).
    ///
    /// Enabled by default.
    pub fn with_os_signals(mut self, enabled: bool) -> Self {
        self.os_signals = enabled;
        self
    }

    /// Stops the run early when `token` is cancelled.
    pub fn with_stop_token(mut self, token: CancellationToken) -> Self {
        self.stop = Some(token);
        self
    }

    /// Validates the configuration and builds the coordinator.
    ///
    /// Nothing is spawned until [`Coordinator::run`].
    pub fn build(self) -> Result<Coordinator, ConfigError> {
        self.cfg.validate()?;
        Ok(Coordinator::new_internal(
            self.cfg,
            self.subscribers,
            self.os_signals,
            self.stop.unwrap_or_default(),
        ))
    }
}
