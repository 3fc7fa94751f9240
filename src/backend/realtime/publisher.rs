/**
 * Revision Publisher
 *
 * In-process pub/sub for committed mutations. The mutation serializer
 * calls `publish` once per commit; the publisher bumps a process-local
 * revision counter and invokes every registered listener synchronously,
 * in registration order.
 *
 * # Registry Safety
 *
 * Each publish pass works on a snapshot of the registry taken under the
 * lock, and the lock is released before any listener runs. Listeners can
 * therefore subscribe or unsubscribe (themselves or others) from inside
 * their callback. Each entry also carries an `active` flag checked right
 * before invocation, so a listener removed earlier in the same pass is
 * not called.
 *
 * A panicking listener is caught and logged; the remaining listeners are
 * still notified and the registry stays intact.
 */
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use crate::shared::RevisionEvent;

type Listener = Arc<dyn Fn(&RevisionEvent) + Send + Sync>;

struct Entry {
    id: u64,
    active: Arc<AtomicBool>,
    listener: Listener,
}

struct PublisherInner {
    revision: AtomicU64,
    next_id: AtomicU64,
    listeners: Mutex<Vec<Entry>>,
}

impl PublisherInner {
    fn remove(&self, id: u64) {
        let removed = {
            let mut listeners = self.listeners.lock().unwrap_or_else(|e| e.into_inner());
            listeners
                .iter()
                .position(|entry| entry.id == id)
                .map(|index| listeners.remove(index))
        };
        // The listener may own other subscriptions; drop it unlocked
        drop(removed);
    }
}

/// Process-wide revision counter and subscription registry
#[derive(Clone)]
pub struct RevisionPublisher {
    inner: Arc<PublisherInner>,
}

impl RevisionPublisher {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(PublisherInner {
                revision: AtomicU64::new(0),
                next_id: AtomicU64::new(1),
                listeners: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Number of commits published by this process
    pub fn current_revision(&self) -> u64 {
        self.inner.revision.load(Ordering::SeqCst)
    }

    /// Register a listener; it stays registered until the returned
    /// `Subscription` is unsubscribed or dropped
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&RevisionEvent) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst);
        let active = Arc::new(AtomicBool::new(true));
        {
            let mut listeners = self.inner.listeners.lock().unwrap_or_else(|e| e.into_inner());
            listeners.push(Entry {
                id,
                active: Arc::clone(&active),
                listener: Arc::new(listener),
            });
        }
        tracing::debug!("[Realtime] Listener {} subscribed", id);
        Subscription {
            id,
            active,
            registry: Arc::downgrade(&self.inner),
        }
    }

    /// Number of registered listeners
    pub fn subscriber_count(&self) -> usize {
        self.inner
            .listeners
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    /// Bump the revision and notify every registered listener
    ///
    /// Only the mutation serializer calls this, once per commit, passing the
    /// marker its save wrote.
    pub(crate) fn publish(&self, marker: u64) -> RevisionEvent {
        let revision = self.inner.revision.fetch_add(1, Ordering::SeqCst) + 1;
        let event = RevisionEvent::now(revision, marker);

        let snapshot: Vec<(u64, Arc<AtomicBool>, Listener)> = {
            let listeners = self.inner.listeners.lock().unwrap_or_else(|e| e.into_inner());
            listeners
                .iter()
                .map(|entry| (entry.id, Arc::clone(&entry.active), Arc::clone(&entry.listener)))
                .collect()
        };

        let mut notified = 0usize;
        for (id, active, listener) in snapshot {
            if !active.load(Ordering::SeqCst) {
                continue;
            }
            match catch_unwind(AssertUnwindSafe(|| listener(&event))) {
                Ok(()) => notified += 1,
                Err(_) => {
                    tracing::warn!("[Realtime] Listener {} panicked on revision {}", id, revision);
                }
            }
        }

        tracing::debug!("[Realtime] Revision {} published to {} listeners", revision, notified);
        event
    }
}

impl Default for RevisionPublisher {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle that removes exactly one listener
///
/// `unsubscribe` is idempotent; dropping the handle unsubscribes too.
pub struct Subscription {
    id: u64,
    active: Arc<AtomicBool>,
    registry: Weak<PublisherInner>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// True until the first `unsubscribe`
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub fn unsubscribe(&self) {
        if !self.active.swap(false, Ordering::SeqCst) {
            return;
        }
        if let Some(inner) = self.registry.upgrade() {
            inner.remove(self.id);
            tracing::debug!("[Realtime] Listener {} unsubscribed", self.id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
