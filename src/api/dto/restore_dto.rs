//! Restore DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::Lsn;
use crate::error::PitrError;
use crate::service::{RestoreReport, RestoreRequest};

/// Request body for `POST /api/v1/restores`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CreateRestoreRequest {
    /// Inclusive replay bound as `HEX/HEX`. Omit to replay all WAL.
    #[serde(default)]
    pub target_lsn: Option<String>,
}

impl CreateRestoreRequest {
    /// Validates the body into a [`RestoreRequest`].
    ///
    /// # Errors
    ///
    /// Returns [`PitrError::InvalidLsn`] if `target_lsn` is not `HEX/HEX`.
    pub fn into_request(self) -> Result<RestoreRequest, PitrError> {
        let target_lsn = self
            .target_lsn
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::parse::<Lsn>)
            .transpose()?;
        Ok(RestoreRequest { target_lsn })
    }
}

/// Response body for a completed restore.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RestoreResponse {
    /// Restore attempt identifier.
    pub restore_id: Uuid,
    /// Replay bound that was configured.
    pub target_lsn: Option<String>,
    /// States entered, `idle` through `completed`.
    pub visited: Vec<String>,
    /// WAL files written by the snapshot step.
    pub snapshotted: Vec<String>,
    /// Best-effort failures that did not stop the restore.
    pub warnings: Vec<String>,
}

impl From<RestoreReport> for RestoreResponse {
    fn from(r: RestoreReport) -> Self {
        Self {
            restore_id: *r.restore_id.as_uuid(),
            target_lsn: r.target_lsn.map(|l| l.to_string()),
            visited: r.visited.iter().map(ToString::to_string).collect(),
            snapshotted: r.snapshotted,
            warnings: r.warnings,
        }
    }
}
