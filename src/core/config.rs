//! # Channel configuration.
//!
//! Provides [`ChannelConfig`], the per-channel dispatch settings.
//!
//! Config is used in two ways:
//! 1. **Channel creation**: `Channel::with_config(name, config)` or via the builder
//! 2. **Per-delivery timeout resolution**: `Subscribe::timeout()` overrides `timeout`
//!
//! ## Sentinel values
//! - `timeout = 0s` → no timeout (a subscriber may run as long as it likes)
//! - `capacity = 0` → no registry preallocation

use std::time::Duration;

/// Dispatch configuration for a [`Channel`](crate::Channel).
///
/// ## Field semantics
/// - `timeout`: Default per-invocation timeout (`0s` = no timeout)
/// - `catch_panics`: Contain subscriber panics as `DeliveryError::Panicked`
/// - `capacity`: Initial registry capacity (`0` = grow on demand)
///
/// ## Notes
/// All fields are public for flexibility. Prefer the helper accessors to avoid
/// sprinkling sentinel checks (`0`) across the codebase.
#[derive(Clone, Debug)]
pub struct ChannelConfig {
    /// Default time a single subscriber invocation may take.
    ///
    /// - `Duration::ZERO` = no timeout
    /// - `> 0` = the invocation is dropped after this long and recorded as
    ///   `DeliveryError::Timeout`; dispatch moves on to the next subscriber
    pub timeout: Duration,

    /// Whether subscriber panics are caught and recorded.
    ///
    /// When `false` a panicking subscriber unwinds through `publish`.
    pub catch_panics: bool,

    /// Registry capacity reserved up front.
    pub capacity: usize,
}

impl ChannelConfig {
    /// Returns the default per-invocation timeout as an `Option`.
    ///
    /// - `None` → no timeout
    /// - `Some(d)` → timeout applied per invocation
    #[inline]
    pub fn default_timeout(&self) -> Option<Duration> {
        if self.timeout == Duration::ZERO {
            None
        } else {
            Some(self.timeout)
        }
    }

    /// Resolves the timeout for one subscriber.
    ///
    /// A subscriber override wins over the channel default; a zero override
    /// disables the timeout for that subscriber.
    #[inline]
    pub fn effective_timeout(&self, subscriber: Option<Duration>) -> Option<Duration> {
        match subscriber {
            Some(d) if d == Duration::ZERO => None,
            Some(d) => Some(d),
            None => self.default_timeout(),
        }
    }
}

impl Default for ChannelConfig {
    /// Default configuration:
    ///
    /// - `timeout = 0s` (no timeout)
    /// - `catch_panics = true`
    /// - `capacity = 0`
    fn default() -> Self {
        Self {
            timeout: Duration::ZERO,
            catch_panics: true,
            capacity: 0,
        }
    }
}
