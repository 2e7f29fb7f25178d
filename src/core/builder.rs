use std::sync::Arc;
use std::time::Duration;

use super::{channel::Channel, config::ChannelConfig};
use crate::error::ChannelError;
use crate::subscribers::Subscribe;

/// Builder for constructing a [`Channel`] with initial subscribers.
pub struct ChannelBuilder<E> {
    name: Arc<str>,
    cfg: ChannelConfig,
    subscribers: Vec<Arc<dyn Subscribe<E>>>,
}

impl<E> ChannelBuilder<E>
where
    E: Send + Sync + 'static,
{
    /// Creates a new builder with the default configuration.
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            cfg: ChannelConfig::default(),
            subscribers: Vec::new(),
        }
    }

    /// Replaces the whole configuration.
    pub fn with_config(mut self, cfg: ChannelConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Sets the default per-invocation timeout (`Duration::ZERO` = none).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.cfg.timeout = timeout;
        self
    }

    /// Sets whether subscriber panics are contained.
    pub fn catch_panics(mut self, yes: bool) -> Self {
        self.cfg.catch_panics = yes;
        self
    }

    /// Sets the initial subscribers, registered in the given order.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe<E>>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds the channel and registers the initial subscribers.
    ///
    /// Their handles are available through [`Channel::handles`].
    pub fn build(self) -> Result<Channel<E>, ChannelError> {
        let mut cfg = self.cfg;
        cfg.capacity = cfg.capacity.max(self.subscribers.len());

        let channel = Channel::with_config(self.name, cfg);
        for sub in self.subscribers {
            channel.subscribe(sub)?;
        }
        Ok(channel)
    }
}
