//! # channelvisor
//!
//! **Channelvisor** is a small subscription registry and notification
//! dispatcher for async Rust.
//!
//! A [`Channel`] owns an ordered set of subscribers for one topic. Producers
//! call [`Channel::publish`]; the channel delivers the event to every
//! subscriber registered at the start of the call, in registration order,
//! and returns a [`PublishReport`] with one outcome per subscriber.
//!
//! ## Architecture
//! ```text
//!   producer A            producer B              subscriber code
//!      │                     │                          │
//!      │ publish(e1)         │ publish(e2)              │ subscribe / unsubscribe
//!      ▼                     ▼                          ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Channel<E>                                                       │
//! │  - Registry (Mutex<Arc<Vec<Entry>>>, copy-on-write, insertion     │
//! │    order, ids never reused)                                       │
//! │  - ChannelConfig (timeout, panic isolation)                       │
//! └──────┬─────────────────────────────────────────────┬──────────────┘
//!        │ snapshot (seq=1) [s1, s2, s3]               │ snapshot (seq=2) [s1, s3]
//!        ▼                                             ▼
//!   s1.on_event ─► s2.on_event ─► s3.on_event     s1.on_event ─► s3.on_event
//!        │              │ Err / timeout / panic        │
//!        ▼              ▼ (recorded, pass continues)   ▼
//!   PublishReport { seq: 1, deliveries: [ok, failed, ok] }   PublishReport { seq: 2, .. }
//! ```
//!
//! ### Guarantees
//! - **Snapshot delivery**: mutations after the snapshot never affect the pass
//!   (including a subscriber removing itself from inside its own callback).
//! - **Ordering**: each pass follows registration order.
//! - **Isolation**: one failing, slow or panicking subscriber never blocks the others.
//! - **No lock during delivery**: the registry lock is held only to mutate or snapshot.
//! - **No retries**: the report gives the caller what it needs to retry.
//!
//! ## Features
//! | Area              | Description                                                   | Key types / traits                         |
//! |-------------------|---------------------------------------------------------------|--------------------------------------------|
//! | **Channel**       | Registry + dispatcher for one topic.                          | [`Channel`], [`ChannelBuilder`]            |
//! | **Subscriber API**| Capability invoked for each event.                            | [`Subscribe`], [`SubscribeFn`]             |
//! | **Identity**      | Opaque, never-reused subscription tokens.                     | [`SubscriberHandle`]                       |
//! | **Results**       | Per-subscriber outcomes of one publish.                       | [`PublishReport`], [`Delivery`]            |
//! | **Errors**        | Structural vs per-delivery errors.                            | [`ChannelError`], [`DeliveryError`]        |
//! | **Configuration** | Per-invocation timeout, panic isolation.                      | [`ChannelConfig`]                          |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use async_trait::async_trait;
//! use channelvisor::{Channel, ChannelConfig, DeliveryError, Envelope, Subscribe};
//!
//! struct User(&'static str);
//!
//! #[async_trait]
//! impl Subscribe<String> for User {
//!     async fn on_event(&self, env: &Envelope<String>) -> Result<(), DeliveryError> {
//!         println!("User {} receives notification from {}: {}", self.0, env.channel(), env.event());
//!         Ok(())
//!     }
//!     fn name(&self) -> &str { self.0 }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut cfg = ChannelConfig::default();
//!     cfg.timeout = Duration::from_secs(1);
//!
//!     let channel: Channel<String> = Channel::with_config("orders", cfg);
//!     let a = channel.subscribe(Arc::new(User("A")))?;
//!     let b = channel.subscribe(Arc::new(User("B")))?;
//!     let c = channel.subscribe(Arc::new(User("C")))?;
//!
//!     assert!(channel.unsubscribe(b)?);
//!
//!     let report = channel.publish("tick".to_string()).await?;
//!     assert_eq!(report.handles(), vec![a, c]);
//!     assert!(report.is_complete_success());
//!     Ok(())
//! }
//! ```

mod core;
mod error;
mod events;
mod subscribers;

// ---- Public re-exports ----

pub use crate::core::{Channel, ChannelBuilder, ChannelConfig, WeakChannel};
pub use error::{ChannelError, DeliveryError};
pub use events::{Delivery, Envelope, PublishReport};
pub use subscribers::{Subscribe, SubscribeFn, SubscriberHandle};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
