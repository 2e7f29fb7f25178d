//! # Channel: subscription registry + notification dispatcher.
//!
//! A [`Channel`] owns an ordered registry of subscriptions for one topic and
//! delivers published events to them.
//!
//! ## Key responsibilities
//! - hand out unique, never-reused [`SubscriberHandle`]s on `subscribe`
//! - remove subscriptions idempotently on `unsubscribe`
//! - on `publish`, snapshot the registry and deliver **in registration order**
//! - contain per-subscriber failures (error, timeout, panic) in a [`PublishReport`]
//! - stop early on caller-side cancellation without rolling anything back
//!
//! ## Publish pass
//! ```text
//! publish(event)
//!   ├─► registry.snapshot()           (lock held only here)
//!   │     └─► seq, [e1, e2, e3]
//!   ├─► Envelope { channel, seq, at, event }
//!   └─► for entry in snapshot:
//!         ├─► cancelled? → report.cancelled = true, stop
//!         ├─► deliver_once(entry, envelope, timeout)
//!         │       (raced against cancellation when a token is given;
//!         │        the interrupted delivery is recorded as Cancelled)
//!         └─► report.push(delivery)
//! ```
//!
//! ## Rules
//! - `subscribe`/`unsubscribe` issued during a pass never affect that pass
//! - Concurrent passes may interleave; each one follows its own snapshot
//! - Structural errors (`Closed`) are returned; delivery errors are reported
//! - No retries
//!
//! ## Example
//! ```rust
//! use channelvisor::{Channel, DeliveryError, Envelope};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let channel: Channel<String> = Channel::new("orders");
//!
//!     let a = channel.subscribe_fn("a", |env: Envelope<String>| async move {
//!         println!("a got {}", env.event());
//!         Ok::<_, DeliveryError>(())
//!     })?;
//!     let b = channel.subscribe_fn("b", |_env: Envelope<String>| async {
//!         Err(DeliveryError::fail("offline"))
//!     })?;
//!
//!     let report = channel.publish("tick".to_string()).await?;
//!     assert_eq!(report.handles(), vec![a, b]);
//!     assert_eq!(report.delivered(), 1);
//!     assert_eq!(report.failed(), 1);
//!
//!     assert!(channel.unsubscribe(b)?);
//!     assert!(!channel.unsubscribe(b)?);
//!     Ok(())
//! }
//! ```

use std::borrow::Cow;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Weak};

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::builder::ChannelBuilder;
use super::config::ChannelConfig;
use super::registry::{Closed, Registry};
use super::runner::{deliver_once, interrupted};
use crate::error::{ChannelError, DeliveryError};
use crate::events::{Envelope, PublishReport};
use crate::subscribers::{next_channel_id, Subscribe, SubscribeFn, SubscriberHandle};

struct Inner<E> {
    id: u64,
    name: Arc<str>,
    config: ChannelConfig,
    registry: Registry<E>,
}

/// Registry and dispatcher for one notification topic.
///
/// Cheap to clone: clones share the same registry. The channel is torn down
/// by [`Channel::close`] or when the last clone is dropped.
pub struct Channel<E> {
    inner: Arc<Inner<E>>,
}

impl<E> Clone for Channel<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E> fmt::Debug for Channel<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl<E> Channel<E>
where
    E: Send + Sync + 'static,
{
    /// Creates a channel with [`ChannelConfig::default`].
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self::with_config(name, ChannelConfig::default())
    }

    /// Creates a channel with an explicit configuration.
    pub fn with_config(name: impl Into<Arc<str>>, config: ChannelConfig) -> Self {
        let id = next_channel_id();
        let name = name.into();
        debug!(channel = %name, id, ?config, "channel created");
        Self {
            inner: Arc::new(Inner {
                id,
                registry: Registry::new(id, config.capacity),
                name,
                config,
            }),
        }
    }

    /// Starts a [`ChannelBuilder`].
    pub fn builder(name: impl Into<Arc<str>>) -> ChannelBuilder<E> {
        ChannelBuilder::new(name)
    }

    /// Diagnostic name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Process-unique channel id (also carried by every handle it issues).
    #[inline]
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Dispatch configuration.
    #[inline]
    pub fn config(&self) -> &ChannelConfig {
        &self.inner.config
    }

    /// Registers `subscriber` at the end of the delivery order.
    ///
    /// The subscriber receives every event whose publish starts after this
    /// call returns. Passes already in flight are unaffected.
    ///
    /// # Errors
    /// [`ChannelError::Closed`] if the channel was torn down.
    pub fn subscribe(&self, subscriber: Arc<dyn Subscribe<E>>) -> Result<SubscriberHandle, ChannelError> {
        let handle = self
            .inner
            .registry
            .insert(subscriber)
            .map_err(|Closed| self.closed())?;
        debug!(channel = %self.inner.name, %handle, "subscribed");
        Ok(handle)
    }

    /// Registers a closure as a subscriber (see [`SubscribeFn`]).
    ///
    /// # Errors
    /// [`ChannelError::Closed`] if the channel was torn down.
    pub fn subscribe_fn<F, Fut>(
        &self,
        name: impl Into<Cow<'static, str>>,
        f: F,
    ) -> Result<SubscriberHandle, ChannelError>
    where
        F: Fn(Envelope<E>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), DeliveryError>> + Send + 'static,
    {
        self.subscribe(SubscribeFn::arc(name, f))
    }

    /// Removes a subscription.
    ///
    /// Returns `Ok(true)` if it was removed and `Ok(false)` if the handle is
    /// unknown, already removed, or was issued by another channel. Removal
    /// never affects a pass whose snapshot was already taken.
    ///
    /// # Errors
    /// [`ChannelError::Closed`] if the channel was torn down.
    pub fn unsubscribe(&self, handle: SubscriberHandle) -> Result<bool, ChannelError> {
        let removed = self
            .inner
            .registry
            .remove(handle)
            .map_err(|Closed| self.closed())?;
        debug!(channel = %self.inner.name, %handle, removed, "unsubscribed");
        Ok(removed)
    }

    /// Strict variant of [`unsubscribe`](Self::unsubscribe).
    ///
    /// # Errors
    /// - [`ChannelError::UnknownSubscriber`] if nothing was removed
    /// - [`ChannelError::Closed`] if the channel was torn down
    pub fn remove(&self, handle: SubscriberHandle) -> Result<(), ChannelError> {
        if self.unsubscribe(handle)? {
            Ok(())
        } else {
            Err(ChannelError::UnknownSubscriber {
                channel: Arc::clone(&self.inner.name),
                handle,
            })
        }
    }

    /// Publishes `event` to every subscriber registered when the call starts.
    ///
    /// Subscribers are invoked one after another in registration order. A
    /// failing, timing-out or panicking subscriber is recorded in the report
    /// and does not stop delivery to the others.
    ///
    /// # Errors
    /// [`ChannelError::Closed`] if the channel was torn down before the
    /// snapshot was taken. Subscriber failures are never returned here.
    pub async fn publish(&self, event: E) -> Result<PublishReport, ChannelError> {
        self.dispatch(Arc::new(event), None).await
    }

    /// Like [`publish`](Self::publish) for an already shared event.
    pub async fn publish_arc(&self, event: Arc<E>) -> Result<PublishReport, ChannelError> {
        self.dispatch(event, None).await
    }

    /// Like [`publish`](Self::publish), but stops at `cancel`.
    ///
    /// ### Cancellation semantics
    /// - The token is checked before each delivery and raced against the
    ///   delivery in flight.
    /// - On cancellation the in-flight delivery is dropped and recorded as
    ///   [`DeliveryError::Cancelled`]; no further subscriber is invoked.
    /// - Nothing is rolled back. Every invoked subscriber has an entry in the
    ///   report, skipped ones are absent, and [`PublishReport::cancelled`] is set.
    pub async fn publish_with_cancel(
        &self,
        event: E,
        cancel: &CancellationToken,
    ) -> Result<PublishReport, ChannelError> {
        self.dispatch(Arc::new(event), Some(cancel)).await
    }

    /// Tears the channel down.
    ///
    /// Every handle is invalidated and every later `subscribe`, `unsubscribe`
    /// or `publish` returns [`ChannelError::Closed`]. Passes already in flight
    /// finish on their snapshot. Returns the number of invalidated handles;
    /// closing twice returns `0`.
    pub fn close(&self) -> usize {
        match self.inner.registry.close() {
            Some(dropped) => {
                info!(channel = %self.inner.name, dropped, "channel closed");
                dropped
            }
            None => 0,
        }
    }

    /// Returns `true` once [`close`](Self::close) was called.
    pub fn is_closed(&self) -> bool {
        self.inner.registry.is_closed()
    }

    /// Number of active subscriptions.
    pub fn len(&self) -> usize {
        self.inner.registry.len()
    }

    /// Returns `true` if there are no active subscriptions.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if `handle` is an active subscription of this channel.
    pub fn contains(&self, handle: SubscriberHandle) -> bool {
        self.inner.registry.contains(handle)
    }

    /// Active handles in delivery order.
    pub fn handles(&self) -> Vec<SubscriberHandle> {
        self.inner.registry.handles()
    }

    /// Creates a non-owning reference, for subscribers that need to reach
    /// their own channel without keeping it alive.
    pub fn downgrade(&self) -> WeakChannel<E> {
        WeakChannel {
            inner: Arc::downgrade(&self.inner),
        }
    }

    async fn dispatch(
        &self,
        event: Arc<E>,
        cancel: Option<&CancellationToken>,
    ) -> Result<PublishReport, ChannelError> {
        let (seq, snapshot) = self
            .inner
            .registry
            .snapshot()
            .map_err(|Closed| self.closed())?;

        let cfg = &self.inner.config;
        let env = Envelope::from_arc(Arc::clone(&self.inner.name), seq, event);
        let mut report = PublishReport::new(Arc::clone(&self.inner.name), seq, snapshot.len());

        for entry in snapshot.iter() {
            let timeout = cfg.effective_timeout(entry.timeout);
            let delivery = deliver_once(entry, &env, timeout, cfg.catch_panics);

            let delivery = match cancel {
                None => delivery.await,
                Some(token) => {
                    if token.is_cancelled() {
                        report.cancelled = true;
                        break;
                    }
                    let started = Instant::now();
                    tokio::select! {
                        biased;
                        _ = token.cancelled() => {
                            report.cancelled = true;
                            report.push(interrupted(entry, &env, started.elapsed()));
                            break;
                        }
                        d = delivery => d,
                    }
                }
            };
            report.push(delivery);
        }

        debug!(
            channel = %self.inner.name,
            seq,
            snapshot = snapshot.len(),
            attempted = report.attempted(),
            failed = report.failed(),
            cancelled = report.cancelled,
            "publish finished"
        );
        Ok(report)
    }

    fn closed(&self) -> ChannelError {
        ChannelError::Closed {
            channel: Arc::clone(&self.inner.name),
        }
    }
}

/// Non-owning reference to a [`Channel`].
pub struct WeakChannel<E> {
    inner: Weak<Inner<E>>,
}

impl<E> WeakChannel<E> {
    /// Returns the channel if at least one strong clone is still alive.
    pub fn upgrade(&self) -> Option<Channel<E>> {
        self.inner.upgrade().map(|inner| Channel { inner })
    }
}

impl<E> Clone for WeakChannel<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<E> fmt::Debug for WeakChannel<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("WeakChannel")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::OnceLock;
    use std::time::Duration;

    /// Records every delivery as `(subscriber, event)`.
    #[derive(Default)]
    struct Journal {
        seen: Mutex<Vec<(String, String)>>,
    }

    impl Journal {
        fn names(&self) -> Vec<String> {
            self.seen.lock().iter().map(|(n, _)| n.clone()).collect()
        }
    }

    struct Recorder {
        name: &'static str,
        journal: Arc<Journal>,
        fail: bool,
    }

    #[async_trait::async_trait]
    impl Subscribe<String> for Recorder {
        async fn on_event(&self, env: &Envelope<String>) -> Result<(), DeliveryError> {
            self.journal
                .seen
                .lock()
                .push((self.name.to_string(), env.event().clone()));
            if self.fail {
                Err(DeliveryError::fail(format!("{} refused", self.name)))
            } else {
                Ok(())
            }
        }

        fn name(&self) -> &str {
            self.name
        }
    }

    fn recorder(name: &'static str, journal: &Arc<Journal>) -> Arc<Recorder> {
        Arc::new(Recorder {
            name,
            journal: Arc::clone(journal),
            fail: false,
        })
    }

    fn failing(name: &'static str, journal: &Arc<Journal>) -> Arc<Recorder> {
        Arc::new(Recorder {
            name,
            journal: Arc::clone(journal),
            fail: true,
        })
    }

    fn outcomes(report: &PublishReport) -> Vec<(String, bool)> {
        report
            .deliveries
            .iter()
            .map(|d| (d.subscriber.to_string(), d.is_ok()))
            .collect()
    }

    #[test]
    fn test_handles_are_pairwise_distinct() {
        let ch: Channel<String> = Channel::new("distinct");
        let journal = Arc::new(Journal::default());
        let mut seen = HashSet::new();
        for _ in 0..100 {
            let h = ch.subscribe(recorder("r", &journal)).unwrap();
            assert!(seen.insert(h));
            if h.id() % 3 == 0 {
                assert!(ch.unsubscribe(h).unwrap());
            }
        }
        assert_eq!(seen.len(), 100);
    }

    #[test]
    fn test_unsubscribe_is_idempotent() {
        let ch: Channel<String> = Channel::new("idem");
        let h = ch.subscribe(recorder("r", &Arc::new(Journal::default()))).unwrap();
        assert!(ch.unsubscribe(h).unwrap());
        assert!(!ch.unsubscribe(h).unwrap());
        assert!(matches!(
            ch.remove(h),
            Err(ChannelError::UnknownSubscriber { handle, .. }) if handle == h
        ));
    }

    #[test]
    fn test_foreign_handle_is_unknown() {
        let a: Channel<String> = Channel::new("a");
        let b: Channel<String> = Channel::new("b");
        let journal = Arc::new(Journal::default());
        let ha = a.subscribe(recorder("r", &journal)).unwrap();
        b.subscribe(recorder("r", &journal)).unwrap();

        assert!(!b.unsubscribe(ha).unwrap());
        assert_eq!(b.len(), 1);
        assert!(a.contains(ha));
        assert!(!b.contains(ha));
    }

    #[tokio::test]
    async fn test_delivers_in_registration_order() {
        let ch: Channel<String> = Channel::new("order");
        let journal = Arc::new(Journal::default());
        let h1 = ch.subscribe(recorder("s1", &journal)).unwrap();
        let h2 = ch.subscribe(recorder("s2", &journal)).unwrap();
        let h3 = ch.subscribe(recorder("s3", &journal)).unwrap();

        let report = ch.publish("e".to_string()).await.unwrap();

        assert_eq!(journal.names(), vec!["s1", "s2", "s3"]);
        assert_eq!(report.handles(), vec![h1, h2, h3]);
        assert_eq!(report.seq, 1);
        assert!(report.is_complete_success());
    }

    #[tokio::test]
    async fn test_failure_is_isolated() {
        let ch: Channel<String> = Channel::new("isolation");
        let journal = Arc::new(Journal::default());
        ch.subscribe(recorder("s1", &journal)).unwrap();
        ch.subscribe(failing("s2", &journal)).unwrap();
        ch.subscribe(recorder("s3", &journal)).unwrap();

        let report = ch.publish("e".to_string()).await.unwrap();

        assert_eq!(
            outcomes(&report),
            vec![
                ("s1".to_string(), true),
                ("s2".to_string(), false),
                ("s3".to_string(), true)
            ]
        );
        assert_eq!(report.delivered(), 2);
        assert_eq!(report.failed(), 1);
        assert_eq!(
            report.deliveries[1].error(),
            Some(&DeliveryError::fail("s2 refused"))
        );
    }

    #[tokio::test]
    async fn test_panicking_subscriber_does_not_abort_pass() {
        let ch: Channel<u32> = Channel::new("panic");
        ch.subscribe_fn("boom", |env: Envelope<u32>| async move {
            if *env.event() > 0 {
                panic!("subscriber exploded");
            }
            Ok::<_, DeliveryError>(())
        })
        .unwrap();
        ch.subscribe_fn("after", |_env: Envelope<u32>| async { Ok(()) })
            .unwrap();

        let report = ch.publish(1).await.unwrap();
        assert_eq!(report.attempted(), 2);
        assert_eq!(
            report.deliveries[0].error(),
            Some(&DeliveryError::Panicked {
                info: "subscriber exploded".to_string()
            })
        );
        assert!(report.deliveries[1].is_ok());
    }

    /// Panics if its timeout is read more than once.
    struct ReadOnceTimeout {
        reads: Arc<AtomicUsize>,
    }

    #[async_trait::async_trait]
    impl Subscribe<u32> for ReadOnceTimeout {
        async fn on_event(&self, _env: &Envelope<u32>) -> Result<(), DeliveryError> {
            Ok(())
        }

        fn name(&self) -> &str {
            "read-once"
        }

        fn timeout(&self) -> Option<Duration> {
            if self.reads.fetch_add(1, Ordering::SeqCst) > 0 {
                panic!("timeout read during delivery");
            }
            Some(Duration::from_secs(1))
        }
    }

    #[tokio::test]
    async fn test_subscriber_timeout_is_read_once_at_subscribe() {
        let ch: Channel<u32> = Channel::new("settings");
        let reads = Arc::new(AtomicUsize::new(0));
        ch.subscribe(Arc::new(ReadOnceTimeout {
            reads: Arc::clone(&reads),
        }))
        .unwrap();
        ch.subscribe_fn("after", |_env: Envelope<u32>| async { Ok(()) })
            .unwrap();
        assert_eq!(reads.load(Ordering::SeqCst), 1);

        for i in 0..3 {
            let report = ch.publish(i).await.unwrap();
            assert!(report.is_complete_success(), "pass {i} failed");
            assert_eq!(report.attempted(), 2);
        }
        assert_eq!(reads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    #[should_panic(expected = "unguarded")]
    async fn test_panics_propagate_when_not_caught() {
        let ch: Channel<u32> = Channel::builder("raw").catch_panics(false).build().unwrap();
        ch.subscribe_fn("p", |env: Envelope<u32>| async move {
            if *env.event() > 0 {
                panic!("unguarded");
            }
            Ok(())
        })
        .unwrap();
        let _ = ch.publish(1).await;
    }

    #[tokio::test]
    async fn test_unsubscribe_during_pass_keeps_snapshot() {
        let ch: Channel<String> = Channel::new("snapshot");
        let journal = Arc::new(Journal::default());
        let s2_handle: Arc<OnceLock<SubscriberHandle>> = Arc::new(OnceLock::new());

        // s1 removes s2 before s2's turn.
        let weak = ch.downgrade();
        let target = Arc::clone(&s2_handle);
        let j = Arc::clone(&journal);
        ch.subscribe_fn("s1", move |env: Envelope<String>| {
            let weak = weak.clone();
            let target = Arc::clone(&target);
            let j = Arc::clone(&j);
            async move {
                j.seen.lock().push(("s1".into(), env.event().clone()));
                if let (Some(ch), Some(h)) = (weak.upgrade(), target.get()) {
                    ch.unsubscribe(*h).map_err(|e| DeliveryError::fail(e.to_string()))?;
                }
                Ok::<(), DeliveryError>(())
            }
        })
        .unwrap();
        let h2 = ch.subscribe(recorder("s2", &journal)).unwrap();
        s2_handle.set(h2).unwrap();
        ch.subscribe(recorder("s3", &journal)).unwrap();

        let report = ch.publish("e".to_string()).await.unwrap();

        assert_eq!(report.attempted(), 3);
        assert_eq!(journal.names(), vec!["s1", "s2", "s3"]);
        assert_eq!(ch.len(), 2);
        assert!(!ch.contains(h2));

        let next = ch.publish("f".to_string()).await.unwrap();
        assert_eq!(next.attempted(), 2);
        assert!(next.get(h2).is_none());
    }

    #[tokio::test]
    async fn test_self_unsubscribe_inside_callback() {
        let ch: Channel<u32> = Channel::new("self");
        let me: Arc<OnceLock<SubscriberHandle>> = Arc::new(OnceLock::new());
        let calls = Arc::new(Mutex::new(0_u32));

        let weak = ch.downgrade();
        let me_cb = Arc::clone(&me);
        let calls_cb = Arc::clone(&calls);
        let h = ch
            .subscribe_fn("once", move |_env: Envelope<u32>| {
                let weak = weak.clone();
                let me = Arc::clone(&me_cb);
                let calls = Arc::clone(&calls_cb);
                async move {
                    *calls.lock() += 1;
                    if let (Some(ch), Some(h)) = (weak.upgrade(), me.get()) {
                        ch.unsubscribe(*h).map_err(|e| DeliveryError::fail(e.to_string()))?;
                    }
                    Ok::<(), DeliveryError>(())
                }
            })
            .unwrap();
        me.set(h).unwrap();
        ch.subscribe_fn("other", |_env: Envelope<u32>| async { Ok(()) })
            .unwrap();

        let first = ch.publish(1).await.unwrap();
        assert_eq!(first.attempted(), 2);
        assert!(first.is_complete_success());

        let second = ch.publish(2).await.unwrap();
        assert_eq!(second.attempted(), 1);
        assert_eq!(*calls.lock(), 1);
    }

    #[tokio::test]
    async fn test_subscribe_during_pass_waits_for_next_publish() {
        let ch: Channel<u32> = Channel::new("late");
        let weak = ch.downgrade();
        ch.subscribe_fn("adder", move |_env: Envelope<u32>| {
            let weak = weak.clone();
            async move {
                if let Some(ch) = weak.upgrade() {
                    ch.subscribe_fn("late", |_env: Envelope<u32>| async { Ok(()) })
                        .map_err(|e| DeliveryError::fail(e.to_string()))?;
                }
                Ok::<(), DeliveryError>(())
            }
        })
        .unwrap();

        let first = ch.publish(1).await.unwrap();
        assert_eq!(first.attempted(), 1);
        assert_eq!(ch.len(), 2);

        let second = ch.publish(2).await.unwrap();
        assert_eq!(second.attempted(), 2);
        assert_eq!(&*second.deliveries[1].subscriber, "late");
    }

    #[tokio::test]
    async fn test_repeated_publish_gives_independent_reports() {
        let ch: Channel<String> = Channel::new("twice");
        let journal = Arc::new(Journal::default());
        ch.subscribe(recorder("s1", &journal)).unwrap();
        ch.subscribe(failing("s2", &journal)).unwrap();

        let r1 = ch.publish("same".to_string()).await.unwrap();
        let r2 = ch.publish("same".to_string()).await.unwrap();

        assert_eq!(outcomes(&r1), outcomes(&r2));
        assert_eq!(r1.handles(), r2.handles());
        assert_eq!((r1.seq, r2.seq), (1, 2));
        assert_eq!(journal.names().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_recorded_and_dispatch_continues() {
        let cfg = ChannelConfig {
            timeout: Duration::from_millis(100),
            ..ChannelConfig::default()
        };
        let ch: Channel<u32> = Channel::with_config("timeouts", cfg);
        ch.subscribe_fn("stuck", |_env: Envelope<u32>| async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(())
        })
        .unwrap();
        ch.subscribe(
            SubscribeFn::arc("patient", |_env: Envelope<u32>| async {
                tokio::time::sleep(Duration::from_millis(500)).await;
                Ok::<_, DeliveryError>(())
            }),
        )
        .unwrap();
        ch.subscribe(Arc::new(
            SubscribeFn::new("patient-override", |_env: Envelope<u32>| async {
                tokio::time::sleep(Duration::from_millis(500)).await;
                Ok::<_, DeliveryError>(())
            })
            .with_timeout(Duration::from_secs(1)),
        ))
        .unwrap();

        let report = ch.publish(7).await.unwrap();

        assert_eq!(report.attempted(), 3);
        assert_eq!(
            report.deliveries[0].error(),
            Some(&DeliveryError::Timeout {
                timeout: Duration::from_millis(100)
            })
        );
        assert!(matches!(
            report.deliveries[1].error(),
            Some(DeliveryError::Timeout { .. })
        ));
        assert!(report.deliveries[2].is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_stops_dispatch_without_rollback() {
        let ch: Channel<u32> = Channel::new("cancel");
        let token = CancellationToken::new();
        let reached = Arc::new(Mutex::new(Vec::new()));

        let r = Arc::clone(&reached);
        ch.subscribe_fn("first", move |_env: Envelope<u32>| {
            let r = Arc::clone(&r);
            async move {
                r.lock().push("first");
                Ok(())
            }
        })
        .unwrap();
        let t = token.clone();
        let r = Arc::clone(&reached);
        ch.subscribe_fn("canceller", move |_env: Envelope<u32>| {
            let t = t.clone();
            let r = Arc::clone(&r);
            async move {
                r.lock().push("canceller");
                t.cancel();
                tokio::time::sleep(Duration::from_secs(10)).await;
                Ok(())
            }
        })
        .unwrap();
        let r = Arc::clone(&reached);
        ch.subscribe_fn("never", move |_env: Envelope<u32>| {
            let r = Arc::clone(&r);
            async move {
                r.lock().push("never");
                Ok(())
            }
        })
        .unwrap();

        let report = ch.publish_with_cancel(1, &token).await.unwrap();

        assert!(report.cancelled);
        assert_eq!(report.attempted(), 2);
        assert!(report.deliveries[0].is_ok());
        assert_eq!(&*report.deliveries[1].subscriber, "canceller");
        assert_eq!(report.deliveries[1].error(), Some(&DeliveryError::Cancelled));
        assert_eq!(report.failed(), 1);
        assert_eq!(*reached.lock(), vec!["first", "canceller"]);
    }

    #[tokio::test]
    async fn test_already_cancelled_token_delivers_nothing() {
        let ch: Channel<u32> = Channel::new("precancelled");
        ch.subscribe_fn("a", |_env: Envelope<u32>| async { Ok(()) })
            .unwrap();
        let token = CancellationToken::new();
        token.cancel();

        let report = ch.publish_with_cancel(1, &token).await.unwrap();
        assert!(report.cancelled);
        assert_eq!(report.attempted(), 0);
    }

    #[tokio::test]
    async fn test_operations_after_close_fail() {
        let ch: Channel<u32> = Channel::new("closing");
        let h = ch
            .subscribe_fn("a", |_env: Envelope<u32>| async { Ok(()) })
            .unwrap();
        ch.subscribe_fn("b", |_env: Envelope<u32>| async { Ok(()) })
            .unwrap();

        assert_eq!(ch.close(), 2);
        assert_eq!(ch.close(), 0);
        assert!(ch.is_closed());
        assert!(ch.is_empty());

        let closed = ChannelError::Closed {
            channel: Arc::from("closing"),
        };
        assert_eq!(ch.unsubscribe(h), Err(closed.clone()));
        assert_eq!(
            ch.subscribe_fn("c", |_env: Envelope<u32>| async { Ok(()) }),
            Err(closed.clone())
        );
        assert_eq!(ch.publish(1).await.err(), Some(closed));
    }

    #[tokio::test]
    async fn test_close_during_pass_finishes_snapshot() {
        let ch: Channel<u32> = Channel::new("close-mid-pass");
        let weak = ch.downgrade();
        ch.subscribe_fn("closer", move |_env: Envelope<u32>| {
            let weak = weak.clone();
            async move {
                if let Some(ch) = weak.upgrade() {
                    ch.close();
                }
                Ok(())
            }
        })
        .unwrap();
        ch.subscribe_fn("tail", |_env: Envelope<u32>| async { Ok(()) })
            .unwrap();

        let report = ch.publish(1).await.unwrap();
        assert_eq!(report.attempted(), 2);
        assert!(ch.is_closed());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_publishes_each_follow_their_snapshot() {
        let ch: Channel<u32> = Channel::new("concurrent");
        let log: Arc<Mutex<Vec<(u64, String)>>> = Arc::new(Mutex::new(Vec::new()));
        for name in ["a", "b", "c", "d"] {
            let log = Arc::clone(&log);
            ch.subscribe_fn(name, move |env: Envelope<u32>| {
                let log = Arc::clone(&log);
                async move {
                    tokio::task::yield_now().await;
                    log.lock().push((env.seq, name.to_string()));
                    Ok(())
                }
            })
            .unwrap();
        }

        let mut joins = Vec::new();
        for i in 0..8 {
            let ch = ch.clone();
            joins.push(tokio::spawn(async move { ch.publish(i).await }));
        }
        for j in joins {
            let report = j.await.unwrap().unwrap();
            assert_eq!(report.attempted(), 4);
        }

        let log = log.lock();
        for seq in 1..=8_u64 {
            let order: Vec<&str> = log
                .iter()
                .filter(|(s, _)| *s == seq)
                .map(|(_, n)| n.as_str())
                .collect();
            assert_eq!(order, vec!["a", "b", "c", "d"], "pass {seq} out of order");
        }
    }
}
