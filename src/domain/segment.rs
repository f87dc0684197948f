//! Catalog rows for observed WAL segments.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// One row per physical WAL file ever observed in the archive.
///
/// `file_name`, `timeline_id` and `created_at` are fixed at first sighting.
/// `is_partial` only ever moves from `true` to `false`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WalSegmentRecord {
    /// Canonical 24-character segment name (suffix stripped). Primary key.
    pub file_name: String,
    /// Timeline parsed from the name.
    pub timeline_id: u32,
    /// 16-character segment suffix of the name.
    pub segment_hex: String,
    /// Whether the file was still being written when last observed.
    pub is_partial: bool,
    /// Size in bytes at the last accepted observation.
    pub file_size_bytes: i64,
    /// First sighting.
    pub created_at: DateTime<Utc>,
    /// Reserved for downstream consumers; never mutated here.
    pub processed: bool,
}

impl WalSegmentRecord {
    /// Builds a fresh record from an archive observation.
    #[must_use]
    pub fn observed(
        file_name: impl Into<String>,
        timeline_id: u32,
        segment_hex: impl Into<String>,
        is_partial: bool,
        file_size_bytes: u64,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            timeline_id,
            segment_hex: segment_hex.into(),
            is_partial,
            file_size_bytes: i64::try_from(file_size_bytes).unwrap_or(i64::MAX),
            created_at: Utc::now(),
            processed: false,
        }
    }
}

/// Decides whether an incoming observation may overwrite a stored row.
///
/// An update is accepted when the segment just completed, or when its size
/// changed. An observation that would turn a completed row back into a
/// partial one is always refused: after a WAL snapshot the `.partial` copy
/// can sit next to its finished canonical file, and whichever the scan sees
/// last must not regress the row.
///
/// The Postgres catalog encodes this same rule in its `ON CONFLICT ... WHERE`
/// clause.
#[must_use]
pub fn accepts_update(existing: &WalSegmentRecord, incoming: &WalSegmentRecord) -> bool {
    if !existing.is_partial && incoming.is_partial {
        return false;
    }
    let completed = existing.is_partial && !incoming.is_partial;
    completed || existing.file_size_bytes != incoming.file_size_bytes
}

/// Applies an accepted update, touching only the mutable columns.
pub fn apply_update(existing: &mut WalSegmentRecord, incoming: &WalSegmentRecord) {
    existing.segment_hex.clone_from(&incoming.segment_hex);
    existing.is_partial = incoming.is_partial;
    existing.file_size_bytes = incoming.file_size_bytes;
}
