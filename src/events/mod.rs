//! Payload wrappers and publish results.
//!
//! - [`Envelope`]: what a subscriber receives for each publish
//! - [`PublishReport`] / [`Delivery`]: what the publisher gets back

mod envelope;
mod report;

pub use envelope::Envelope;
pub use report::{Delivery, PublishReport};
