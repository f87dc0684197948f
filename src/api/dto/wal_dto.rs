//! WAL catalog DTOs.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::WalSegmentRecord;
use crate::monitor::TickReport;
use crate::persistence::WalLsnInfo;

/// One cataloged segment.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WalSegmentDto {
    /// Canonical 24-character segment name.
    pub file_name: String,
    /// Timeline parsed from the name.
    pub timeline_id: u32,
    /// 16-character segment part of the name.
    pub segment_hex: String,
    /// Whether the segment was still being written when last seen.
    pub is_partial: bool,
    /// Size at the last accepted observation.
    pub file_size_bytes: i64,
    /// First sighting.
    pub created_at: DateTime<Utc>,
    /// Reserved for downstream consumers.
    pub processed: bool,
}

impl From<WalSegmentRecord> for WalSegmentDto {
    fn from(r: WalSegmentRecord) -> Self {
        Self {
            file_name: r.file_name,
            timeline_id: r.timeline_id,
            segment_hex: r.segment_hex,
            is_partial: r.is_partial,
            file_size_bytes: r.file_size_bytes,
            created_at: r.created_at,
            processed: r.processed,
        }
    }
}

/// Response body for `GET /api/v1/wal/segments`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WalSegmentListResponse {
    /// Segments in WAL order.
    pub segments: Vec<WalSegmentDto>,
    /// Number of segments.
    pub total: usize,
}

/// A restorable position.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WalLsnDto {
    /// Canonical segment name.
    pub file_name: String,
    /// Start LSN of the segment (e.g. `"0/3000000"`).
    pub start_lsn: String,
}

impl From<WalLsnInfo> for WalLsnDto {
    fn from(info: WalLsnInfo) -> Self {
        Self {
            file_name: info.file_name,
            start_lsn: info.start_lsn.to_string(),
        }
    }
}

/// Response body for `POST /api/v1/wal/sync`.
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct SyncResponse {
    /// Entries that classified as WAL segments.
    pub scanned: usize,
    /// Entries ignored.
    pub skipped: usize,
    /// Rows inserted or updated.
    pub changed: usize,
    /// Segments whose upsert failed.
    pub failed: usize,
}

impl From<TickReport> for SyncResponse {
    fn from(r: TickReport) -> Self {
        Self {
            scanned: r.scanned,
            skipped: r.skipped,
            changed: r.changed,
            failed: r.failed,
        }
    }
}
