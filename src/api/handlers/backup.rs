//! Base backup handlers.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;

use crate::api::dto::{BackupCompletedResponse, BackupStatusResponse};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, PitrError};

/// `GET /backups/latest` — Whether a base backup exists.
#[utoipa::path(
    get,
    path = "/api/v1/backups/latest",
    tag = "Backups",
    summary = "Latest backup status",
    description = "Reports whether the latest base backup's marker file is present.",
    responses(
        (status = 200, description = "Backup status", body = BackupStatusResponse),
    )
)]
pub async fn backup_status(State(state): State<AppState>) -> impl IntoResponse {
    Json(BackupStatusResponse::from(state.service.backup_status().await))
}

/// `POST /backups` — Take a fresh base backup.
///
/// Blocks until the backup utility exits.
///
/// # Errors
///
/// Returns [`PitrError`] if another maintenance operation is running or the
/// backup fails.
#[utoipa::path(
    post,
    path = "/api/v1/backups",
    tag = "Backups",
    summary = "Trigger a base backup",
    description = "Wipes the latest snapshot and replaces it with a streaming base backup of the primary. On failure the error details carry the utility's output.",
    responses(
        (status = 200, description = "Backup completed", body = BackupCompletedResponse),
        (status = 409, description = "Another backup or restore is running", body = ErrorResponse),
        (status = 502, description = "Backup command failed", body = ErrorResponse),
    )
)]
pub async fn trigger_backup(State(state): State<AppState>) -> Result<impl IntoResponse, PitrError> {
    state.service.trigger_backup().await?;
    Ok(Json(BackupCompletedResponse {
        status: "completed".to_string(),
        completed_at: Utc::now(),
    }))
}

/// Backup routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/backups", post(trigger_backup))
        .route("/backups/latest", get(backup_status))
}
