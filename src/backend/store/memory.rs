//! In-memory store backend
//!
//! Keeps the durable record in process memory. Clones share the same
//! record, which lets tests stand up several `Store`s (one per simulated
//! server process) over one "durable" medium. Outages can be simulated with
//! `set_unavailable`.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use super::backend::{PersistedRecord, StoreBackend};
use super::StoreError;
use crate::backend::realtime::beacon::ChangeBeacon;
use crate::shared::DataSet;

#[derive(Clone, Default)]
pub struct MemoryStore {
    record: Arc<Mutex<PersistedRecord>>,
    unavailable: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing record
    pub fn with_record(record: PersistedRecord) -> Self {
        Self {
            record: Arc::new(Mutex::new(record)),
            unavailable: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Make every operation fail with `StoreError::Unavailable` until reset
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Copy of the stored record
    pub fn snapshot(&self) -> PersistedRecord {
        self.record
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ChangeBeacon for MemoryStore {
    async fn advance(&self) -> Result<u64, StoreError> {
        self.check_available()?;
        let mut record = self.record.lock().unwrap_or_else(|e| e.into_inner());
        record.marker += 1;
        Ok(record.marker)
    }

    async fn current_marker(&self) -> Result<u64, StoreError> {
        self.check_available()?;
        Ok(self.record.lock().unwrap_or_else(|e| e.into_inner()).marker)
    }
}

#[async_trait]
impl StoreBackend for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn load(&self) -> Result<DataSet, StoreError> {
        self.check_available()?;
        Ok(self
            .record
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .data
            .clone())
    }

    async fn save(&self, data: &DataSet) -> Result<u64, StoreError> {
        self.check_available()?;
        let mut record = self.record.lock().unwrap_or_else(|e| e.into_inner());
        record.data = data.clone();
        record.marker += 1;
        Ok(record.marker)
    }
}
