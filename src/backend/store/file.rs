//! JSON file-based store backend
//!
//! The whole record (`{"marker": n, "data": {...}}`) lives in one JSON
//! document. Writes go to a temporary sibling file that is flushed to disk
//! and then renamed over the original, so readers in any process see either
//! the old or the new aggregate, never a torn one.
//!
//! Several processes may point at the same file. Every marker
//! read-modify-write holds an exclusive lock on a sibling `.lock` file, so
//! each commit gets its own marker value. The data itself is still
//! last-write-wins across processes.

use async_trait::async_trait;
use fs2::FileExt;
use serde::Deserialize;
use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use super::backend::{PersistedRecord, StoreBackend};
use super::StoreError;
use crate::backend::realtime::beacon::ChangeBeacon;
use crate::shared::DataSet;

/// Only the marker, for cheap-ish beacon polls
#[derive(Deserialize)]
struct MarkerOnly {
    #[serde(default)]
    marker: u64,
}

/// Held exclusive lock on the store's lock file; released on drop
struct ProcessLock {
    file: File,
}

impl Drop for ProcessLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            tracing::warn!("[Store] Failed to release store lock: {}", e);
        }
    }
}

pub struct JsonFileStore {
    path: PathBuf,
    lock_path: PathBuf,
    /// Serializes this process's writers before they queue on the file lock
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Open a store at the given file path, creating parent directories
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let lock_path = path.with_file_name(format!(".{}.lock", file_name(&path)));
        tracing::info!("[Store] Using JSON file store at {}", path.display());
        Ok(Self {
            path,
            lock_path,
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Block (off the runtime) until no other process holds the store lock
    async fn lock_across_processes(&self) -> Result<ProcessLock, StoreError> {
        let lock_path = self.lock_path.clone();
        let file = tokio::task::spawn_blocking(move || -> std::io::Result<File> {
            let file = OpenOptions::new()
                .create(true)
                .truncate(false)
                .read(true)
                .write(true)
                .open(&lock_path)?;
            file.lock_exclusive()?;
            Ok(file)
        })
        .await
        .map_err(|e| StoreError::Interrupted(e.to_string()))??;
        Ok(ProcessLock { file })
    }

    async fn read_text(&self) -> Result<Option<String>, StoreError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn read_record(&self) -> Result<PersistedRecord, StoreError> {
        match self.read_text().await? {
            Some(text) => Ok(serde_json::from_str(&text)?),
            None => Ok(PersistedRecord::default()),
        }
    }

    async fn write_record(&self, record: &PersistedRecord) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(record)?;
        let temp_path = self.path.with_file_name(format!(
            ".{}.{}.tmp",
            file_name(&self.path),
            uuid::Uuid::new_v4()
        ));

        let replaced = async {
            let mut file = tokio::fs::File::create(&temp_path).await?;
            file.write_all(&json).await?;
            file.sync_all().await?;
            drop(file);
            tokio::fs::rename(&temp_path, &self.path).await
        }
        .await;
        if let Err(e) = replaced {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(e.into());
        }
        Ok(())
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "store.json".to_string())
}

#[async_trait]
impl ChangeBeacon for JsonFileStore {
    async fn advance(&self) -> Result<u64, StoreError> {
        let _guard = self.write_lock.lock().await;
        let _process_lock = self.lock_across_processes().await?;
        let mut record = self.read_record().await?;
        record.marker += 1;
        self.write_record(&record).await?;
        Ok(record.marker)
    }

    async fn current_marker(&self) -> Result<u64, StoreError> {
        match self.read_text().await? {
            Some(text) => Ok(serde_json::from_str::<MarkerOnly>(&text)?.marker),
            None => Ok(0),
        }
    }
}

#[async_trait]
impl StoreBackend for JsonFileStore {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn load(&self) -> Result<DataSet, StoreError> {
        Ok(self.read_record().await?.data)
    }

    async fn save(&self, data: &DataSet) -> Result<u64, StoreError> {
        let _guard = self.write_lock.lock().await;
        let _process_lock = self.lock_across_processes().await?;
        let marker = self.current_marker().await? + 1;
        let record = PersistedRecord {
            marker,
            data: data.clone(),
        };
        self.write_record(&record).await?;
        tracing::debug!("[Store] Wrote {} (marker {})", self.path.display(), marker);
        Ok(marker)
    }
}
