//! In-memory [`RecordStore`] for tests and local development.

use std::collections::{BTreeMap, BTreeSet};

use tokio::sync::RwLock;

use crate::{RecordError, RecordStore};

/// Records and their links, held in memory.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    records: RwLock<BTreeMap<String, BTreeSet<String>>>,
    ignore_writes: bool,
}

impl MemoryRecordStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that accepts every link and stores none of them, like a
    /// service silently ignoring an unknown field.
    #[must_use]
    pub fn ignoring_writes() -> Self {
        Self {
            ignore_writes: true,
            ..Self::default()
        }
    }

    /// Creates an empty record if it does not exist yet.
    pub async fn insert_record(&self, record_id: &str) {
        self.records
            .write()
            .await
            .entry(record_id.to_string())
            .or_default();
    }
}

#[async_trait::async_trait]
impl RecordStore for MemoryRecordStore {
    async fn link(&self, record_id: &str, linked_ids: &[String]) -> Result<(), RecordError> {
        let mut records = self.records.write().await;
        let links = records
            .get_mut(record_id)
            .ok_or_else(|| RecordError::NotFound {
                record_id: record_id.to_string(),
            })?;

        if !self.ignore_writes {
            links.extend(linked_ids.iter().cloned());
        }
        Ok(())
    }

    async fn linked_ids(&self, record_id: &str) -> Result<Vec<String>, RecordError> {
        self.records
            .read()
            .await
            .get(record_id)
            .map(|links| links.iter().cloned().collect())
            .ok_or_else(|| RecordError::NotFound {
                record_id: record_id.to_string(),
            })
    }
}
