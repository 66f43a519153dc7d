//! Trait seams toward the excluded persistence layer.
//!
//! The core does not prescribe a storage format; it requires atomic
//! single-record writes and most-recent-by-subject retrieval. Measurement
//! records are append-style (a new capture supersedes, never mutates), which
//! keeps concurrent readers and writers safe without fine-grained locking.
//! The in-memory implementations back the CLI and the test suite.

use crate::{clothing::ClothingAttributeRecord, measurement::MeasurementRecord, Result};
use std::collections::HashMap;
use std::sync::RwLock;

/// Durable store for measurement records
pub trait MeasurementStore: Send + Sync {
    /// Append a new record; earlier records for the subject are superseded,
    /// not replaced
    fn append(&self, record: MeasurementRecord) -> Result<()>;

    /// Most recent record for a subject, by derivation timestamp
    fn latest(&self, subject: &str) -> Result<Option<MeasurementRecord>>;
}

/// Durable store for wardrobe attribute records
pub trait WardrobeStore: Send + Sync {
    /// Insert or replace the record for an item (re-analysis replaces)
    fn upsert(&self, record: ClothingAttributeRecord) -> Result<()>;

    /// All records, in unspecified order
    fn all(&self) -> Result<Vec<ClothingAttributeRecord>>;

    /// Remove an item's record; returns whether it existed
    fn remove(&self, item_id: &str) -> Result<bool>;
}

/// In-memory measurement store
#[derive(Default)]
pub struct InMemoryMeasurementStore {
    records: RwLock<Vec<MeasurementRecord>>,
}

impl InMemoryMeasurementStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl MeasurementStore for InMemoryMeasurementStore {
    fn append(&self, record: MeasurementRecord) -> Result<()> {
        self.records
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(record);
        Ok(())
    }

    fn latest(&self, subject: &str) -> Result<Option<MeasurementRecord>> {
        let records = self
            .records
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(records
            .iter()
            .filter(|r| r.subject == subject)
            .max_by_key(|r| r.derived_at)
            .cloned())
    }
}

/// In-memory wardrobe store
#[derive(Default)]
pub struct InMemoryWardrobeStore {
    records: RwLock<HashMap<String, ClothingAttributeRecord>>,
}

impl InMemoryWardrobeStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl WardrobeStore for InMemoryWardrobeStore {
    fn upsert(&self, record: ClothingAttributeRecord) -> Result<()> {
        self.records
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(record.id.clone(), record);
        Ok(())
    }

    fn all(&self) -> Result<Vec<ClothingAttributeRecord>> {
        let records = self
            .records
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut items: Vec<ClothingAttributeRecord> = records.values().cloned().collect();
        items.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(items)
    }

    fn remove(&self, item_id: &str) -> Result<bool> {
        Ok(self
            .records
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .remove(item_id)
            .is_some())
    }
}
