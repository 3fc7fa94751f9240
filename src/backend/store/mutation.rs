/**
 * Mutation Serializer
 *
 * `Store` is the single write path for the shared data set. Every write
 * handler hands it a transform; the store runs the transform in an
 * exclusive critical section:
 *
 * 1. Acquire the process-wide write lock (FIFO: first to ask, first to run)
 * 2. Load the current data set from the backend
 * 3. Run the transform
 * 4. Save the result (which advances the change beacon marker)
 * 5. Publish the new revision to local listeners
 *
 * If the transform rejects the request nothing is saved or published and
 * the previously committed data set stays authoritative. If the save
 * fails nothing is published.
 *
 * # Cancellation
 *
 * The critical section runs on its own tokio task. A caller that stops
 * waiting (for example, a client that hangs up mid-request) cannot cut a
 * transform, save or publish short.
 *
 * # Reads
 *
 * `read` goes straight to the backend without taking the write lock, so it
 * may observe state that a mutation in flight is about to replace. Callers
 * that need read-your-writes must read inside a transform.
 */
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::backend::StoreBackend;
use super::{MutationError, PersistenceFailure, StoreError, ValidationFailure};
use crate::backend::realtime::publisher::RevisionPublisher;
use crate::shared::DataSet;

struct StoreInner {
    backend: Arc<dyn StoreBackend>,
    publisher: RevisionPublisher,
    write_lock: Mutex<()>,
}

/// Shared handle to the data set; cheap to clone
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

impl Store {
    /// Create a store over `backend` with a fresh revision publisher
    pub fn new(backend: Arc<dyn StoreBackend>) -> Self {
        Self::with_publisher(backend, RevisionPublisher::new())
    }

    pub fn with_publisher(backend: Arc<dyn StoreBackend>, publisher: RevisionPublisher) -> Self {
        tracing::info!("[Store] Store initialized with {} backend", backend.name());
        Self {
            inner: Arc::new(StoreInner {
                backend,
                publisher,
                write_lock: Mutex::new(()),
            }),
        }
    }

    pub fn backend(&self) -> Arc<dyn StoreBackend> {
        Arc::clone(&self.inner.backend)
    }

    pub fn publisher(&self) -> &RevisionPublisher {
        &self.inner.publisher
    }

    pub fn current_revision(&self) -> u64 {
        self.inner.publisher.current_revision()
    }

    /// Current data set, without taking the write lock
    pub async fn read(&self) -> Result<DataSet, PersistenceFailure> {
        self.inner.backend.load().await.map_err(|e| {
            tracing::warn!("[Store] Read failed: {}", e);
            PersistenceFailure::from(e)
        })
    }

    /// Run `transform` exclusively against the current data set
    ///
    /// The transform receives the data set by value and returns the next
    /// data set plus a result for the caller. It may await I/O, but the
    /// write lock is held the whole time, so slow transforms delay every
    /// other writer in this process.
    pub async fn mutate<F, Fut, R>(&self, transform: F) -> Result<R, MutationError>
    where
        F: FnOnce(DataSet) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(DataSet, R), ValidationFailure>> + Send + 'static,
        R: Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(async move { inner.run_exclusive(transform).await });

        match task.await {
            Ok(result) => result,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(e) => {
                tracing::error!("[Store] Mutation task did not complete: {}", e);
                Err(StoreError::Interrupted(e.to_string()).into())
            }
        }
    }

    /// Synchronous variant of `mutate` that edits the data set in place
    ///
    /// Edits made before the transform returns an error are discarded.
    pub async fn update<F, R>(&self, transform: F) -> Result<R, MutationError>
    where
        F: FnOnce(&mut DataSet) -> Result<R, ValidationFailure> + Send + 'static,
        R: Send + 'static,
    {
        self.mutate(move |mut data| {
            let outcome = transform(&mut data).map(|value| (data, value));
            std::future::ready(outcome)
        })
        .await
    }
}

impl StoreInner {
    async fn run_exclusive<F, Fut, R>(&self, transform: F) -> Result<R, MutationError>
    where
        F: FnOnce(DataSet) -> Fut,
        Fut: Future<Output = Result<(DataSet, R), ValidationFailure>>,
    {
        let _guard = self.write_lock.lock().await;

        let data = self.backend.load().await.map_err(|e| {
            tracing::warn!("[Store] Load failed, mutation aborted: {}", e);
            PersistenceFailure::from(e)
        })?;

        let (next, result) = match transform(data).await {
            Ok(outcome) => outcome,
            Err(failure) => {
                tracing::debug!("[Store] Transform rejected: {}", failure);
                return Err(failure.into());
            }
        };

        let marker = self.backend.save(&next).await.map_err(|e| {
            tracing::error!("[Store] Save failed, mutation not committed: {}", e);
            PersistenceFailure::from(e)
        })?;

        // Published while still holding the lock so revision order is commit order
        let event = self.publisher.publish(marker);
        tracing::info!(
            "[Store] Committed revision {} (marker {})",
            event.revision,
            marker
        );

        Ok(result)
    }
}
