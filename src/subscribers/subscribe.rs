//! # Core subscriber trait
//!
//! `Subscribe` is the single capability a subscriber supplies to a
//! [`Channel`](crate::Channel): receive one envelope, report success or
//! failure. Heterogeneous subscribers are stored side by side as
//! `Arc<dyn Subscribe<E>>`.
//!
//! ## Contract
//! - Invoked sequentially within one publish pass, in registration order.
//! - Implementations may be slow; they never hold the channel's registry lock,
//!   so they may call `subscribe`/`unsubscribe` on the same channel.
//! - A returned `Err`, a timeout, or a panic is recorded for this subscriber
//!   only; the pass continues with the next subscriber.
//! - Each subscriber may **declare** its own timeout via [`Subscribe::timeout`];
//!   otherwise the channel default applies.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use channelvisor::{DeliveryError, Envelope, Subscribe};
//!
//! struct Audit;
//!
//! #[async_trait]
//! impl Subscribe<String> for Audit {
//!     async fn on_event(&self, env: &Envelope<String>) -> Result<(), DeliveryError> {
//!         if env.event().is_empty() {
//!             return Err(DeliveryError::fail("empty event"));
//!         }
//!         // write audit record...
//!         Ok(())
//!     }
//!
//!     fn name(&self) -> &str { "audit" }
//! }
//! ```

use std::time::Duration;

use async_trait::async_trait;

use crate::error::DeliveryError;
use crate::events::Envelope;

/// Contract for event subscribers.
#[async_trait]
pub trait Subscribe<E>: Send + Sync + 'static {
    /// Handle a single published event.
    ///
    /// # Parameters
    /// - `env`: Reference to the envelope (does not transfer ownership)
    async fn on_event(&self, env: &Envelope<E>) -> Result<(), DeliveryError>;

    /// Human-readable name (for logs and reports).
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Per-invocation timeout for this subscriber.
    ///
    /// `None` (default) defers to [`ChannelConfig::timeout`](crate::ChannelConfig::timeout).
    fn timeout(&self) -> Option<Duration> {
        None
    }
}
