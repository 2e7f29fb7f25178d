//! # Subscriber handles
//!
//! A [`SubscriberHandle`] is the opaque token returned by
//! [`Channel::subscribe`](crate::Channel::subscribe) and the only valid
//! argument to [`Channel::unsubscribe`](crate::Channel::unsubscribe).
//!
//! ## Identity
//! - `channel`: process-unique id of the issuing channel
//! - `id`: per-channel subscription counter (starts at 1, never reused)
//!
//! Two handles are equal iff both parts are equal, so a handle issued by one
//! channel never matches an entry of another channel.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

/// Global counter used to give every channel a distinct id.
static CHANNEL_SEQ: AtomicU64 = AtomicU64::new(1);

/// Allocates the next process-unique channel id.
pub(crate) fn next_channel_id() -> u64 {
    CHANNEL_SEQ.fetch_add(1, AtomicOrdering::Relaxed)
}

/// Opaque identity of one subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberHandle {
    channel: u64,
    id: u64,
}

impl SubscriberHandle {
    #[inline]
    pub(crate) fn new(channel: u64, id: u64) -> Self {
        Self { channel, id }
    }

    /// Id of the subscription within its channel.
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Id of the channel that issued this handle.
    #[inline]
    pub fn channel_id(&self) -> u64 {
        self.channel
    }
}

impl fmt::Display for SubscriberHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.channel, self.id)
    }
}
