//! # Deliver one envelope to one subscriber.
//!
//! Executes a single [`Subscribe::on_event`](crate::Subscribe::on_event) call
//! with optional timeout and panic isolation, and turns the result into a
//! [`Delivery`] record.
//!
//! ## Outcome mapping
//! ```text
//! on_event() → Ok(())          → Delivery { outcome: Ok }
//! on_event() → Err(e)          → Delivery { outcome: Err(e) }
//! timeout exceeded             → future dropped → Err(Timeout { timeout })
//! panic (catch_panics = true)  → Err(Panicked { info })
//! pass cancelled mid-delivery  → Err(Cancelled)          (see `interrupted`)
//! ```
//!
//! ## Rules
//! - Always produces **exactly one** [`Delivery`]
//! - Never retries
//! - A timed-out future is dropped, which cancels it at its next await point

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::FutureExt;
use tokio::time::{self, Instant};
use tracing::{trace, warn};

use crate::core::registry::Entry;
use crate::error::DeliveryError;
use crate::events::{Delivery, Envelope};

/// Delivers `env` to `entry`, bounded by `timeout`.
///
/// ### Timeout behavior
/// If `timeout` is `Some(dur)`:
/// - Wraps the invocation in `tokio::time::timeout`
/// - On expiry: drops the invocation, returns `DeliveryError::Timeout`
///
/// ### Panic behavior
/// With `catch_panics` the invocation runs under `catch_unwind`; a panic
/// becomes `DeliveryError::Panicked`. Without it the panic propagates.
/// The `on_event` call itself happens inside the guard, so a panic raised
/// before the returned future is first polled is contained too.
pub(crate) async fn deliver_once<E>(
    entry: &Entry<E>,
    env: &Envelope<E>,
    timeout: Option<Duration>,
    catch_panics: bool,
) -> Delivery
where
    E: Send + Sync + 'static,
{
    let started = Instant::now();
    let invocation = guarded(
        async { entry.subscriber.on_event(env).await },
        catch_panics,
    );

    let outcome = match timeout {
        Some(dur) => match time::timeout(dur, invocation).await {
            Ok(r) => r,
            Err(_elapsed) => Err(DeliveryError::Timeout { timeout: dur }),
        },
        None => invocation.await,
    };
    record(entry, env, outcome, started.elapsed())
}

/// Record for a delivery whose pass was cancelled while it was in flight.
pub(crate) fn interrupted<E>(entry: &Entry<E>, env: &Envelope<E>, elapsed: Duration) -> Delivery {
    record(entry, env, Err(DeliveryError::Cancelled), elapsed)
}

fn record<E>(
    entry: &Entry<E>,
    env: &Envelope<E>,
    outcome: Result<(), DeliveryError>,
    elapsed: Duration,
) -> Delivery {
    match &outcome {
        Ok(()) => trace!(
            channel = %env.channel,
            seq = env.seq,
            subscriber = %entry.name,
            handle = %entry.handle,
            ?elapsed,
            "delivered"
        ),
        Err(err) => warn!(
            channel = %env.channel,
            seq = env.seq,
            subscriber = %entry.name,
            handle = %entry.handle,
            reason = err.as_label(),
            error = %err,
            "delivery failed"
        ),
    }

    Delivery {
        handle: entry.handle,
        subscriber: entry.name.clone(),
        outcome,
        elapsed,
    }
}

/// Optionally wraps `fut` in `catch_unwind`.
async fn guarded<F>(fut: F, catch_panics: bool) -> Result<(), DeliveryError>
where
    F: Future<Output = Result<(), DeliveryError>>,
{
    if !catch_panics {
        return fut.await;
    }
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(r) => r,
        Err(panic_err) => Err(DeliveryError::Panicked {
            info: panic_message(&*panic_err),
        }),
    }
}

/// Renders a panic payload as text.
fn panic_message(any: &(dyn Any + Send)) -> String {
    if let Some(msg) = any.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = any.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
