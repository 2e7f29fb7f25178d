//! # Subscribers: the capability side of a channel.
//!
//! This module provides the [`Subscribe`] trait, the closure adapter
//! [`SubscribeFn`], and the opaque [`SubscriberHandle`] returned on
//! registration.
//!
//! ## Architecture
//! ```text
//! Channel::publish(event)
//!     │
//!     └──► snapshot [h1, h2, h3] ──► h1.on_event(&Envelope) ──► Ok
//!                                ──► h2.on_event(&Envelope) ──► Err / timeout / panic (recorded)
//!                                ──► h3.on_event(&Envelope) ──► Ok
//! ```
//!
//! ## Implementing custom subscribers
//! ```no_run
//! use async_trait::async_trait;
//! use channelvisor::{DeliveryError, Envelope, Subscribe};
//!
//! struct Mailbox { owner: String }
//!
//! #[async_trait]
//! impl Subscribe<String> for Mailbox {
//!     async fn on_event(&self, env: &Envelope<String>) -> Result<(), DeliveryError> {
//!         println!("{} receives notification from {}: {}", self.owner, env.channel(), env.event());
//!         Ok(())
//!     }
//! }
//! ```

mod handle;
#[cfg(feature = "logging")]
mod log;
mod subscribe;
mod subscribe_fn;

pub(crate) use handle::next_channel_id;
pub use handle::SubscriberHandle;
#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use subscribe::Subscribe;
pub use subscribe_fn::SubscribeFn;
