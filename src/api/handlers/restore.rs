//! Restore handler.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::dto::{CreateRestoreRequest, RestoreResponse};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, PitrError};

/// `POST /restores` — Restore the target from the latest backup.
///
/// Blocks until the target has been launched or a step fails. The body is
/// optional; without one all available WAL is replayed.
///
/// # Errors
///
/// Returns [`PitrError`] on a malformed LSN, a missing backup, a concurrent
/// maintenance operation, or a failed restore step.
#[utoipa::path(
    post,
    path = "/api/v1/restores",
    tag = "Restores",
    summary = "Run a point-in-time restore",
    description = "Stops the restore target, snapshots in-flight WAL, repopulates the data directory from the latest base backup, writes recovery settings and starts the engine. With `target_lsn` replay stops at that position (inclusive).",
    request_body = CreateRestoreRequest,
    responses(
        (status = 200, description = "Restore target launched", body = RestoreResponse),
        (status = 400, description = "Malformed target LSN", body = ErrorResponse),
        (status = 409, description = "No base backup, or another operation is running", body = ErrorResponse),
        (status = 500, description = "Archive snapshot failed", body = ErrorResponse),
        (status = 502, description = "A restore command failed", body = ErrorResponse),
    )
)]
pub async fn create_restore(
    State(state): State<AppState>,
    body: Option<Json<CreateRestoreRequest>>,
) -> Result<impl IntoResponse, PitrError> {
    let request = body.map(|Json(req)| req).unwrap_or_default().into_request()?;
    let report = state.service.perform_restore(request).await?;
    Ok(Json(RestoreResponse::from(report)))
}

/// Restore routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/restores", post(create_restore))
}
