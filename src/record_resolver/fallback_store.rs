//! Local fallback store
//!
//! In-memory keyed store of normalized equipment records, optionally seeded
//! from a JSON file so scanning keeps working without a reachable backend.

use crate::equipment::{normalize_record, EquipmentRecord};
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::path::Path;
use tokio::fs;
use tokio::sync::RwLock;

/// FallbackStore instance
pub struct FallbackStore {
    records: RwLock<HashMap<String, EquipmentRecord>>,
}

impl FallbackStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Load records from a JSON seed file (array of wire-format objects)
    ///
    /// Seed entries run through the same wire normalization as remote bodies,
    /// so either field-naming convention works. Returns the number of records
    /// loaded.
    pub async fn load_seed(&self, path: &Path) -> Result<usize> {
        let raw = fs::read_to_string(path).await?;
        let entries: Vec<serde_json::Value> = serde_json::from_str(&raw)
            .map_err(|e| Error::Parse(format!("seed file is not a JSON array: {}", e)))?;

        let mut loaded = 0;
        let mut records = self.records.write().await;
        for entry in entries {
            let record = normalize_record(entry)?;
            records.insert(record.id.clone(), record);
            loaded += 1;
        }

        tracing::info!(
            path = %path.display(),
            records = loaded,
            "Fallback store seeded"
        );

        Ok(loaded)
    }

    /// Keyed lookup by identifier
    pub async fn get(&self, id: &str) -> Option<EquipmentRecord> {
        self.records.read().await.get(id).cloned()
    }

    /// Insert or replace a record
    pub async fn insert(&self, record: EquipmentRecord) {
        self.records
            .write()
            .await
            .insert(record.id.clone(), record);
    }

    /// Number of records held
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }
}

impl Default for FallbackStore {
    fn default() -> Self {
        Self::new()
    }
}
