//! # LogWriter: simple envelope logger
//!
//! A minimal subscriber that logs every envelope it receives through
//! [`tracing`] at `INFO` level. Use it for tests or demos.
//!
//! ## Example output (with `tracing-subscriber` fmt layer)
//! ```text
//! INFO channelvisor::subscribers::log: notification channel="orders" seq=1 subscriber="LogWriter" event="tick"
//! ```

use std::fmt::Debug;

use async_trait::async_trait;

use crate::error::DeliveryError;
use crate::events::Envelope;
use crate::subscribers::Subscribe;

/// Envelope writer subscriber.
#[derive(Debug, Clone)]
pub struct LogWriter {
    name: String,
}

impl LogWriter {
    /// Construct a new [`LogWriter`] named `LogWriter`.
    #[must_use]
    pub fn new() -> Self {
        Self::named("LogWriter")
    }

    /// Construct a writer with a custom name (shows up in reports and log lines).
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for LogWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<E> Subscribe<E> for LogWriter
where
    E: Debug + Send + Sync + 'static,
{
    async fn on_event(&self, env: &Envelope<E>) -> Result<(), DeliveryError> {
        tracing::info!(
            channel = %env.channel,
            seq = env.seq,
            subscriber = %self.name,
            event = ?env.event(),
            "notification"
        );
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
