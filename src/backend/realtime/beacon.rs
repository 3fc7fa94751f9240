/**
 * Cross-Instance Change Beacon
 *
 * Server processes share no memory, so the revision publisher of one
 * process never reaches the stream connections of another. Instead every
 * commit advances a durable marker stored next to the data set, and every
 * stream connection polls that marker.
 *
 * The beacon only says "some instance committed something since you last
 * looked". It carries no payload and no ordering.
 *
 * Every `StoreBackend` is a `ChangeBeacon`; backends fold `advance` into
 * the same durable write as `save`.
 */
use async_trait::async_trait;
use std::sync::Arc;

use crate::backend::store::StoreError;

/// Durable, cheaply-pollable change marker
#[async_trait]
pub trait ChangeBeacon: Send + Sync {
    /// Advance the marker without changing the data set; returns the new marker
    async fn advance(&self) -> Result<u64, StoreError>;

    /// Read the current marker
    async fn current_marker(&self) -> Result<u64, StoreError>;
}

#[async_trait]
impl<T: ChangeBeacon + ?Sized> ChangeBeacon for Arc<T> {
    async fn advance(&self) -> Result<u64, StoreError> {
        (**self).advance().await
    }

    async fn current_marker(&self) -> Result<u64, StoreError> {
        (**self).current_marker().await
    }
}

/// Poll-and-compare state of one observer
///
/// The first successful observation only records a baseline. Afterwards a
/// strictly greater marker signals a change exactly once and becomes the
/// new baseline. Equal or lower markers never signal, and a failed poll
/// leaves the baseline alone so the next interval simply tries again.
#[derive(Debug, Clone, Default)]
pub struct BeaconPoller {
    last_seen: Option<u64>,
}

impl BeaconPoller {
    pub fn new() -> Self {
        Self::default()
    }

    /// Poller that already observed `marker`
    pub fn with_baseline(marker: u64) -> Self {
        Self {
            last_seen: Some(marker),
        }
    }

    /// Last marker this poller accepted
    pub fn last_seen(&self) -> Option<u64> {
        self.last_seen
    }

    /// Feed one poll result; returns true when a change should be signaled
    pub fn observe<E>(&mut self, result: Result<u64, E>) -> bool {
        let marker = match result {
            Ok(marker) => marker,
            Err(_) => return false,
        };

        match self.last_seen {
            None => {
                self.last_seen = Some(marker);
                false
            }
            Some(previous) if marker > previous => {
                self.last_seen = Some(marker);
                true
            }
            Some(_) => false,
        }
    }

    /// Accept `marker` as seen without signaling
    ///
    /// Used for markers this process wrote itself and already announced.
    /// Never moves the baseline backwards.
    pub fn advance_to(&mut self, marker: u64) {
        if self.last_seen.map_or(true, |seen| marker > seen) {
            self.last_seen = Some(marker);
        }
    }

    /// Poll `beacon` once and compare
    pub async fn poll(&mut self, beacon: &dyn ChangeBeacon) -> bool {
        let result = beacon.current_marker().await;
        if let Err(ref e) = result {
            tracing::debug!("[Realtime] Beacon poll failed, retrying next interval: {}", e);
        }
        self.observe(result)
    }
}
