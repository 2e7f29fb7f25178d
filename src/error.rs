//! Error types used by channels and subscriber deliveries.
//!
//! This module defines two main error enums:
//!
//! - [`ChannelError`]: structural errors returned synchronously to the caller
//!   of a channel operation.
//! - [`DeliveryError`]: per-subscriber failures recorded in a
//!   [`PublishReport`](crate::PublishReport); never propagated past `publish`.
//!
//! Both types provide helper methods (`as_label`, `as_message`) for logging/metrics
//! and additional utilities such as [`DeliveryError::is_retryable`].

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::subscribers::SubscriberHandle;

/// # Errors produced by channel operations.
///
/// These are fatal to the call that produced them and are returned as an
/// explicit `Err` to the immediate caller.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    /// The channel was torn down; no further operations are accepted.
    #[error("channel {channel:?} is closed")]
    Closed {
        /// Diagnostic name of the closed channel.
        channel: Arc<str>,
    },

    /// The handle is not registered on this channel.
    ///
    /// Only produced by [`Channel::remove`](crate::Channel::remove);
    /// [`Channel::unsubscribe`](crate::Channel::unsubscribe) signals the same
    /// condition with `Ok(false)`.
    #[error("subscriber {handle} is not registered on channel {channel:?}")]
    UnknownSubscriber {
        /// Diagnostic name of the channel.
        channel: Arc<str>,
        /// The rejected handle.
        handle: SubscriberHandle,
    },
}

impl ChannelError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use channelvisor::ChannelError;
    ///
    /// let err = ChannelError::Closed { channel: "orders".into() };
    /// assert_eq!(err.as_label(), "channel_closed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ChannelError::Closed { .. } => "channel_closed",
            ChannelError::UnknownSubscriber { .. } => "channel_unknown_subscriber",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            ChannelError::Closed { channel } => format!("closed: channel={channel}"),
            ChannelError::UnknownSubscriber { channel, handle } => {
                format!("unknown subscriber: channel={channel} handle={handle}")
            }
        }
    }
}

/// # Errors produced by a single subscriber delivery.
///
/// Each variant is a flavour of subscriber failure. They are isolated to the
/// subscriber that produced them: the channel records the error and moves on
/// to the next subscriber.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    /// The subscriber returned an error.
    #[error("delivery failed: {error}")]
    Failed {
        /// The underlying error message.
        error: String,
    },

    /// The subscriber did not finish within the per-invocation timeout.
    #[error("timed out after {timeout:?}")]
    Timeout {
        /// The timeout duration that was exceeded.
        timeout: Duration,
    },

    /// The subscriber panicked while handling the event.
    #[error("subscriber panicked: {info}")]
    Panicked {
        /// Panic payload rendered as text.
        info: String,
    },

    /// The publish pass was cancelled while this delivery was in flight.
    ///
    /// The invocation started and was dropped at its next await point; any
    /// side effects it produced before that are not rolled back.
    #[error("delivery cancelled")]
    Cancelled,
}

impl DeliveryError {
    /// Convenience constructor for [`DeliveryError::Failed`].
    ///
    /// # Example
    /// ```
    /// use channelvisor::DeliveryError;
    ///
    /// let err = DeliveryError::fail("mailbox full");
    /// assert_eq!(err.to_string(), "delivery failed: mailbox full");
    /// ```
    pub fn fail(error: impl Into<String>) -> Self {
        DeliveryError::Failed {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use channelvisor::DeliveryError;
    /// use std::time::Duration;
    ///
    /// let err = DeliveryError::Timeout { timeout: Duration::from_secs(1) };
    /// assert_eq!(err.as_label(), "delivery_timeout");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            DeliveryError::Failed { .. } => "delivery_failed",
            DeliveryError::Timeout { .. } => "delivery_timeout",
            DeliveryError::Panicked { .. } => "delivery_panicked",
            DeliveryError::Cancelled => "delivery_cancelled",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            DeliveryError::Failed { error } => format!("error: {error}"),
            DeliveryError::Timeout { timeout } => format!("timeout: {timeout:?}"),
            DeliveryError::Panicked { info } => format!("panic: {info}"),
            DeliveryError::Cancelled => "cancelled".to_string(),
        }
    }

    /// Indicates whether a producer may reasonably retry this delivery.
    ///
    /// Returns `true` for [`DeliveryError::Failed`], [`DeliveryError::Timeout`]
    /// and [`DeliveryError::Cancelled`], `false` for [`DeliveryError::Panicked`].
    ///
    /// The channel never retries on its own; this is a hint for callers that
    /// build a retry policy on top of a [`PublishReport`](crate::PublishReport).
    ///
    /// # Example
    /// ```
    /// use channelvisor::DeliveryError;
    ///
    /// assert!(DeliveryError::fail("boom").is_retryable());
    /// assert!(!DeliveryError::Panicked { info: "oops".into() }.is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DeliveryError::Failed { .. }
                | DeliveryError::Timeout { .. }
                | DeliveryError::Cancelled
        )
    }
}

impl From<String> for DeliveryError {
    fn from(error: String) -> Self {
        DeliveryError::Failed { error }
    }
}

impl From<&str> for DeliveryError {
    fn from(error: &str) -> Self {
        DeliveryError::Failed {
            error: error.to_string(),
        }
    }
}
