//! # Function-backed subscriber (`SubscribeFn`)
//!
//! [`SubscribeFn`] wraps a closure `F: Fn(Envelope<E>) -> Fut`, producing a fresh
//! future per delivery. The closure receives an owned (cheaply cloned) envelope,
//! so the returned future can be `'static` without borrowing from the channel.
//!
//! ## Concurrency semantics
//! - Each delivery creates a **new** future owning its state.
//! - No hidden mutation between deliveries; share state explicitly via `Arc<...>`
//!   inside the closure.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use channelvisor::{DeliveryError, Envelope, Subscribe, SubscribeFn};
//!
//! let s: Arc<dyn Subscribe<u32>> = SubscribeFn::arc("doubler", |env: Envelope<u32>| async move {
//!     let _ = *env.event() * 2;
//!     Ok::<_, DeliveryError>(())
//! });
//!
//! assert_eq!(s.name(), "doubler");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::DeliveryError;
use crate::events::Envelope;
use crate::subscribers::Subscribe;

/// Function-backed subscriber implementation.
#[derive(Debug)]
pub struct SubscribeFn<F> {
    name: Cow<'static, str>,
    timeout: Option<Duration>,
    f: F,
}

impl<F> SubscribeFn<F> {
    /// Creates a new function-backed subscriber.
    ///
    /// Prefer [`SubscribeFn::arc`] when you immediately need an `Arc<dyn Subscribe<E>>`.
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            timeout: None,
            f,
        }
    }

    /// Creates the subscriber and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }

    /// Overrides the channel's default timeout for this subscriber.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[async_trait]
impl<E, F, Fut> Subscribe<E> for SubscribeFn<F>
where
    E: Send + Sync + 'static,
    F: Fn(Envelope<E>) -> Fut + Send + Sync + 'static, // Fn, not FnMut
    Fut: Future<Output = Result<(), DeliveryError>> + Send + 'static,
{
    async fn on_event(&self, env: &Envelope<E>) -> Result<(), DeliveryError> {
        (self.f)(env.clone()).await
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}
