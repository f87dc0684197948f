//! In-memory catalog.
//!
//! Used by tests and by `CATALOG_BACKEND=memory` deployments that only need
//! the monitor and restore orchestration without a metadata database.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::WalCatalog;
use crate::domain::WalSegmentRecord;
use crate::domain::segment::{accepts_update, apply_update};
use crate::error::PitrError;

/// Catalog backed by an ordered map keyed by file name.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    rows: RwLock<BTreeMap<String, WalSegmentRecord>>,
}

impl InMemoryCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stored row for `file_name`, if any.
    pub async fn get(&self, file_name: &str) -> Option<WalSegmentRecord> {
        self.rows.read().await.get(file_name).cloned()
    }

    /// Returns the number of rows.
    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    /// Returns `true` if the catalog holds no rows.
    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

#[async_trait]
impl WalCatalog for InMemoryCatalog {
    async fn upsert(&self, record: &WalSegmentRecord) -> Result<bool, PitrError> {
        let mut rows = self.rows.write().await;
        match rows.entry(record.file_name.clone()) {
            Entry::Vacant(slot) => {
                let mut fresh = record.clone();
                fresh.processed = false;
                slot.insert(fresh);
                Ok(true)
            }
            Entry::Occupied(mut slot) => {
                let existing = slot.get_mut();
                if !accepts_update(existing, record) {
                    return Ok(false);
                }
                apply_update(existing, record);
                Ok(true)
            }
        }
    }

    async fn list_file_names_ascending(&self) -> Result<Vec<String>, PitrError> {
        Ok(self.rows.read().await.keys().cloned().collect())
    }

    async fn list_segments(&self) -> Result<Vec<WalSegmentRecord>, PitrError> {
        Ok(self.rows.read().await.values().cloned().collect())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    const NAME: &str = "000000010000000000000001";

    fn record(is_partial: bool, size: u64) -> WalSegmentRecord {
        WalSegmentRecord::observed(NAME, 1, "0000000000000001", is_partial, size)
    }

    #[tokio::test]
    async fn same_record_twice_changes_once() {
        let catalog = InMemoryCatalog::new();
        let r = record(true, 1000);
        assert!(matches!(catalog.upsert(&r).await, Ok(true)));
        assert!(matches!(catalog.upsert(&r).await, Ok(false)));
        assert_eq!(catalog.len().await, 1);
    }

    #[tokio::test]
    async fn completion_updates_row() {
        let catalog = InMemoryCatalog::new();
        let _ = catalog.upsert(&record(true, 1000)).await;
        assert!(matches!(catalog.upsert(&record(false, 16_777_216)).await, Ok(true)));

        let Some(stored) = catalog.get(NAME).await else {
            panic!("row missing");
        };
        assert!(!stored.is_partial);
        assert_eq!(stored.file_size_bytes, 16_777_216);
    }

    #[tokio::test]
    async fn completed_row_ignores_partial_sightings() {
        let catalog = InMemoryCatalog::new();
        let _ = catalog.upsert(&record(false, 16_777_216)).await;
        let Some(before) = catalog.get(NAME).await else {
            panic!("row missing");
        };

        for size in [0, 1000, 16_777_216, 20_000_000] {
            assert!(matches!(catalog.upsert(&record(true, size)).await, Ok(false)));
        }
        assert_eq!(catalog.get(NAME).await, Some(before));
    }

    #[tokio::test]
    async fn created_at_is_set_once() {
        let catalog = InMemoryCatalog::new();
        let first = record(true, 1000);
        let _ = catalog.upsert(&first).await;
        let mut later = record(true, 5000);
        later.created_at = first.created_at + chrono::Duration::seconds(30);
        let _ = catalog.upsert(&later).await;

        let Some(stored) = catalog.get(NAME).await else {
            panic!("row missing");
        };
        assert_eq!(stored.created_at, first.created_at);
        assert_eq!(stored.file_size_bytes, 5000);
    }

    #[tokio::test]
    async fn names_list_in_wal_order() {
        let catalog = InMemoryCatalog::new();
        let names = [
            "000000020000000000000001",
            "000000010000000100000000",
            "0000000100000000000000FF",
            "000000010000000000000002",
        ];
        for name in names {
            let Some(parsed) = crate::domain::parse_wal_filename(name) else {
                panic!("fixture should parse");
            };
            let r = WalSegmentRecord::observed(name, parsed.timeline_id, parsed.segment_hex, false, 1);
            let _ = catalog.upsert(&r).await;
        }

        let Ok(listed) = catalog.list_file_names_ascending().await else {
            panic!("listing failed");
        };
        assert_eq!(
            listed,
            vec![
                "000000010000000000000002",
                "0000000100000000000000FF",
                "000000010000000100000000",
                "000000020000000000000001",
            ]
        );

        // Within a timeline, name order is LSN order.
        let lsns: Vec<_> = listed
            .iter()
            .take(3)
            .filter_map(|n| crate::domain::compute_start_lsn(n).ok())
            .collect();
        assert!(lsns.windows(2).all(|w| matches!(w, [a, b] if a < b)));
    }
}
