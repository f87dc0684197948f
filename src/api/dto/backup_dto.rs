//! Backup DTOs.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::service::BackupStatus;

/// Response body for `GET /api/v1/backups/latest`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BackupStatusResponse {
    /// Whether a base backup has completed at least once.
    pub exists: bool,
    /// Marker file whose presence is checked.
    pub marker_path: String,
}

impl From<BackupStatus> for BackupStatusResponse {
    fn from(s: BackupStatus) -> Self {
        Self {
            exists: s.exists,
            marker_path: s.marker_path.display().to_string(),
        }
    }
}

/// Response body for `POST /api/v1/backups`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BackupCompletedResponse {
    /// Always `"completed"`.
    pub status: String,
    /// Completion time.
    pub completed_at: DateTime<Utc>,
}
