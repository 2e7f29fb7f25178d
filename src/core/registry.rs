//! # Subscriber registry - ordered, copy-on-write.
//!
//! The registry is the only shared mutable state of a channel. It keeps the
//! active subscriptions in insertion order behind a short-lived mutex.
//!
//! ## Architecture
//! ```text
//! subscribe()   ──► lock ──► make_mut(entries).push(entry)      ──► unlock
//! unsubscribe() ──► lock ──► make_mut(entries).remove(pos)      ──► unlock
//! snapshot()    ──► lock ──► seq += 1; Arc::clone(&entries)     ──► unlock
//!                                         │
//!                                         └──► publish pass iterates this
//!                                              immutable view without the lock
//! ```
//!
//! ## Rules
//! - Lock is **never** held while a subscriber runs
//! - A snapshot is never mutated; writers clone the vector if a snapshot is alive
//! - Subscription ids come from a counter that only grows (never reused)
//! - Once closed, the registry rejects every operation

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::subscribers::{Subscribe, SubscriberHandle};

/// One registered subscription.
pub(crate) struct Entry<E> {
    pub(crate) handle: SubscriberHandle,
    pub(crate) name: Arc<str>,
    /// The subscriber's own timeout, read once at registration.
    pub(crate) timeout: Option<Duration>,
    pub(crate) subscriber: Arc<dyn Subscribe<E>>,
}

impl<E> Clone for Entry<E> {
    fn clone(&self) -> Self {
        Self {
            handle: self.handle,
            name: Arc::clone(&self.name),
            timeout: self.timeout,
            subscriber: Arc::clone(&self.subscriber),
        }
    }
}

/// Immutable view of the registry taken at the start of a publish pass.
pub(crate) type Snapshot<E> = Arc<Vec<Entry<E>>>;

/// Marker returned by every operation on a closed registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Closed;

struct State<E> {
    entries: Arc<Vec<Entry<E>>>,
    next_id: u64,
    next_seq: u64,
    closed: bool,
}

/// Ordered registry of active subscriptions for one channel.
pub(crate) struct Registry<E> {
    channel_id: u64,
    state: Mutex<State<E>>,
}

impl<E> Registry<E>
where
    E: Send + Sync + 'static,
{
    /// Creates an empty registry for the channel with id `channel_id`.
    pub(crate) fn new(channel_id: u64, capacity: usize) -> Self {
        Self {
            channel_id,
            state: Mutex::new(State {
                entries: Arc::new(Vec::with_capacity(capacity)),
                next_id: 1,
                next_seq: 1,
                closed: false,
            }),
        }
    }

    /// Appends a subscriber and returns its freshly allocated handle.
    ///
    /// `name()` and `timeout()` are read here, outside the lock, and never
    /// again during delivery.
    pub(crate) fn insert(&self, subscriber: Arc<dyn Subscribe<E>>) -> Result<SubscriberHandle, Closed> {
        let name: Arc<str> = Arc::from(subscriber.name());
        let timeout = subscriber.timeout();

        let mut st = self.state.lock();
        if st.closed {
            return Err(Closed);
        }
        let handle = SubscriberHandle::new(self.channel_id, st.next_id);
        st.next_id += 1;
        Arc::make_mut(&mut st.entries).push(Entry {
            handle,
            name,
            timeout,
            subscriber,
        });
        Ok(handle)
    }

    /// Removes `handle`; returns `Ok(false)` if it is not registered here.
    pub(crate) fn remove(&self, handle: SubscriberHandle) -> Result<bool, Closed> {
        let mut st = self.state.lock();
        if st.closed {
            return Err(Closed);
        }
        if handle.channel_id() != self.channel_id {
            return Ok(false);
        }
        match st.entries.iter().position(|e| e.handle == handle) {
            Some(pos) => {
                Arc::make_mut(&mut st.entries).remove(pos);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Takes the next publish sequence number together with a snapshot.
    pub(crate) fn snapshot(&self) -> Result<(u64, Snapshot<E>), Closed> {
        let mut st = self.state.lock();
        if st.closed {
            return Err(Closed);
        }
        let seq = st.next_seq;
        st.next_seq += 1;
        Ok((seq, Arc::clone(&st.entries)))
    }

    /// Closes the registry and drops every entry.
    ///
    /// Returns the number of invalidated handles, or `None` if it was already closed.
    pub(crate) fn close(&self) -> Option<usize> {
        let dropped = {
            let mut st = self.state.lock();
            if st.closed {
                return None;
            }
            st.closed = true;
            std::mem::take(&mut st.entries)
        };
        // Entries (and possibly the last reference to a subscriber) are dropped
        // outside the lock.
        Some(dropped.len())
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    pub(crate) fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub(crate) fn contains(&self, handle: SubscriberHandle) -> bool {
        let st = self.state.lock();
        st.entries.iter().any(|e| e.handle == handle)
    }

    /// Handles in registration order.
    pub(crate) fn handles(&self) -> Vec<SubscriberHandle> {
        let entries = Arc::clone(&self.state.lock().entries);
        entries.iter().map(|e| e.handle).collect()
    }
}
