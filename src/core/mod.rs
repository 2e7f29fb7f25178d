//! Channel core: registry, dispatch and configuration.
//!
//! The public API from this module is [`Channel`] (with [`WeakChannel`]),
//! [`ChannelBuilder`] and [`ChannelConfig`].
//!
//! Internal modules:
//! - [`registry`]: ordered copy-on-write registry, the only locked state;
//! - [`runner`]: delivers one envelope to one subscriber with timeout/panic isolation;
//! - [`channel`]: subscribe/unsubscribe/publish and the publish pass;
//! - [`builder`]: builder with initial subscribers;
//! - [`config`]: dispatch settings.

mod builder;
mod channel;
mod config;
mod registry;
mod runner;

pub use builder::ChannelBuilder;
pub use channel::{Channel, WeakChannel};
pub use config::ChannelConfig;
