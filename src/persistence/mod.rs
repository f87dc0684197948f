//! Persistence layer: the WAL segment catalog.
//!
//! [`WalCatalog`] is the store contract used by the monitor and the API.
//! [`PostgresCatalog`] keeps rows in the `wal_metadata` table through
//! `sqlx::PgPool`; [`InMemoryCatalog`] applies the same rules to a map.
//!
//! Stores never retry. A failed call is reported to the caller, which
//! decides whether to log and move on.

pub mod memory;
pub mod models;
pub mod postgres;

use std::fmt;

use async_trait::async_trait;

use crate::domain::{WalSegmentRecord, compute_start_lsn};
use crate::error::PitrError;

pub use memory::InMemoryCatalog;
pub use models::WalLsnInfo;
pub use postgres::PostgresCatalog;

/// Idempotent store of WAL segment metadata.
#[async_trait]
pub trait WalCatalog: Send + Sync + fmt::Debug {
    /// Inserts the record if its `file_name` is new; otherwise updates the
    /// mutable columns only when [`crate::domain::segment::accepts_update`]
    /// allows it.
    ///
    /// Returns whether a row was inserted or changed.
    async fn upsert(&self, record: &WalSegmentRecord) -> Result<bool, PitrError>;

    /// Returns every cataloged file name in ascending lexicographic order,
    /// which for fixed-width hex names is WAL order.
    async fn list_file_names_ascending(&self) -> Result<Vec<String>, PitrError>;

    /// Returns every cataloged row ordered by file name.
    async fn list_segments(&self) -> Result<Vec<WalSegmentRecord>, PitrError>;
}

/// Lists the start LSN of every cataloged segment in WAL order.
///
/// Names for which no LSN can be computed are skipped.
///
/// # Errors
///
/// Returns the catalog's error if the file names cannot be listed.
pub async fn available_lsns(catalog: &dyn WalCatalog) -> Result<Vec<WalLsnInfo>, PitrError> {
    let names = catalog.list_file_names_ascending().await?;
    Ok(names
        .into_iter()
        .filter_map(|file_name| match compute_start_lsn(&file_name) {
            Ok(start_lsn) => Some(WalLsnInfo {
                file_name,
                start_lsn,
            }),
            Err(e) => {
                tracing::debug!(%file_name, error = %e, "skipping uncomputable catalog entry");
                None
            }
        })
        .collect())
}
