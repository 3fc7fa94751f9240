/**
 * Durable Store Accessor
 *
 * A `StoreBackend` loads and persists the whole shared data set. There are
 * no partial reads or writes: `load` returns the complete aggregate and
 * `save` replaces it.
 *
 * The change beacon marker lives in the same durable record as the data
 * set, so `save` advances it in the same write and returns the new value.
 *
 * # Consistency
 *
 * - `load` never returns a value older than the last `save` this process
 *   completed.
 * - Saves from one process never overlap; the mutation serializer sees
 *   to that.
 * - Saves from different processes race and the last write wins. No
 *   cross-process optimistic concurrency is attempted.
 */
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::backend::realtime::beacon::ChangeBeacon;
use crate::backend::store::StoreError;
use crate::shared::DataSet;

/// The single durable record: beacon marker plus data set
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PersistedRecord {
    #[serde(default)]
    pub marker: u64,
    #[serde(default)]
    pub data: DataSet,
}

/// Whole-aggregate load/save over some backing medium
#[async_trait]
pub trait StoreBackend: ChangeBeacon {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Load the complete data set; an empty medium yields an empty set
    async fn load(&self) -> Result<DataSet, StoreError>;

    /// Replace the data set and advance the marker in one write
    async fn save(&self, data: &DataSet) -> Result<u64, StoreError>;
}
