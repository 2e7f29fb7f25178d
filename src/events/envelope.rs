//! # Envelope delivered to subscribers.
//!
//! Every [`Channel::publish`](crate::Channel::publish) call wraps the payload
//! once into an [`Envelope`] and hands a reference to it to every subscriber
//! of the pass. The payload is shared (`Arc<E>`), so cloning an envelope is
//! cheap and never clones the event itself.
//!
//! ## Ordering
//! `seq` is assigned per channel and increases monotonically with each
//! publish. Two envelopes from concurrent publishes may reach a subscriber in
//! either order; use `seq` to restore publish order when it matters.
//!
//! ## Example
//! ```rust
//! use channelvisor::Envelope;
//!
//! let env = Envelope::new("orders", 1, "tick");
//! assert_eq!(env.channel(), "orders");
//! assert_eq!(*env.event(), "tick");
//! ```

use std::ops::Deref;
use std::sync::Arc;
use std::time::SystemTime;

/// One published event as seen by a subscriber.
#[derive(Debug)]
pub struct Envelope<E> {
    /// Name of the publishing channel.
    pub channel: Arc<str>,
    /// Per-channel publish sequence number (starts at 1).
    pub seq: u64,
    /// Wall-clock time at which the publish started.
    pub at: SystemTime,
    /// Shared event payload.
    pub event: Arc<E>,
}

impl<E> Envelope<E> {
    /// Creates an envelope stamped with the current time.
    pub fn new(channel: impl Into<Arc<str>>, seq: u64, event: E) -> Self {
        Self::from_arc(channel.into(), seq, Arc::new(event))
    }

    pub(crate) fn from_arc(channel: Arc<str>, seq: u64, event: Arc<E>) -> Self {
        Self {
            channel,
            seq,
            at: SystemTime::now(),
            event,
        }
    }

    /// Name of the publishing channel.
    #[inline]
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Borrow the event payload.
    #[inline]
    pub fn event(&self) -> &E {
        &self.event
    }
}

impl<E> Clone for Envelope<E> {
    fn clone(&self) -> Self {
        Self {
            channel: Arc::clone(&self.channel),
            seq: self.seq,
            at: self.at,
            event: Arc::clone(&self.event),
        }
    }
}

impl<E> Deref for Envelope<E> {
    type Target = E;

    fn deref(&self) -> &E {
        &self.event
    }
}
