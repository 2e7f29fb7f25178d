//! # Per-publish delivery report.
//!
//! [`PublishReport`] is the structured outcome of one publish pass. It holds
//! one [`Delivery`] per subscriber that was attempted, in snapshot order.
//!
//! ## Rules
//! - A delivery is recorded for every subscriber whose turn **completed**
//!   (success, error, timeout, or panic).
//! - If the pass was cancelled, subscribers interrupted or never reached are
//!   **absent** and [`PublishReport::cancelled`] is `true`.
//! - Aggregate counts are derived from the list, never stored separately.

use std::sync::Arc;
use std::time::Duration;

use crate::error::DeliveryError;
use crate::subscribers::SubscriberHandle;

/// Outcome of delivering one event to one subscriber.
#[derive(Debug, Clone)]
pub struct Delivery {
    /// Handle of the subscription that was invoked.
    pub handle: SubscriberHandle,
    /// Diagnostic name of the subscriber.
    pub subscriber: Arc<str>,
    /// `Ok(())` on success, the contained failure otherwise.
    pub outcome: Result<(), DeliveryError>,
    /// Time spent inside the subscriber (bounded by the timeout, if any).
    pub elapsed: Duration,
}

impl Delivery {
    /// Returns `true` if the subscriber handled the event successfully.
    #[inline]
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }

    /// Returns the failure detail, if any.
    #[inline]
    pub fn error(&self) -> Option<&DeliveryError> {
        self.outcome.as_ref().err()
    }
}

/// Structured result of a single [`Channel::publish`](crate::Channel::publish) call.
#[derive(Debug, Clone)]
pub struct PublishReport {
    /// Name of the publishing channel.
    pub channel: Arc<str>,
    /// Per-channel publish sequence number.
    pub seq: u64,
    /// Deliveries in snapshot (registration) order.
    pub deliveries: Vec<Delivery>,
    /// Set when the pass was cancelled before reaching every subscriber.
    pub cancelled: bool,
}

impl PublishReport {
    pub(crate) fn new(channel: Arc<str>, seq: u64, capacity: usize) -> Self {
        Self {
            channel,
            seq,
            deliveries: Vec::with_capacity(capacity),
            cancelled: false,
        }
    }

    /// Number of subscribers actually invoked.
    #[inline]
    pub fn attempted(&self) -> usize {
        self.deliveries.len()
    }

    /// Number of successful deliveries.
    pub fn delivered(&self) -> usize {
        self.deliveries.iter().filter(|d| d.is_ok()).count()
    }

    /// Number of failed deliveries (errors, timeouts and panics).
    pub fn failed(&self) -> usize {
        self.deliveries.iter().filter(|d| !d.is_ok()).count()
    }

    /// Returns `true` if every attempted delivery succeeded and the pass was not cancelled.
    pub fn is_complete_success(&self) -> bool {
        !self.cancelled && self.deliveries.iter().all(Delivery::is_ok)
    }

    /// Iterates over failed deliveries only.
    pub fn failures(&self) -> impl Iterator<Item = &Delivery> {
        self.deliveries.iter().filter(|d| !d.is_ok())
    }

    /// Handles of the invoked subscribers, in delivery order.
    pub fn handles(&self) -> Vec<SubscriberHandle> {
        self.deliveries.iter().map(|d| d.handle).collect()
    }

    /// Returns the delivery recorded for `handle`, if it was attempted.
    pub fn get(&self, handle: SubscriberHandle) -> Option<&Delivery> {
        self.deliveries.iter().find(|d| d.handle == handle)
    }

    #[inline]
    pub(crate) fn push(&mut self, delivery: Delivery) {
        self.deliveries.push(delivery);
    }
}
