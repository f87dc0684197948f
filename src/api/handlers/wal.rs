//! WAL catalog handlers: segment listing, LSN listing, on-demand sync.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{SyncResponse, WalLsnDto, WalSegmentDto, WalSegmentListResponse};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, PitrError};

/// `GET /wal/segments` — List cataloged segments.
///
/// # Errors
///
/// Returns [`PitrError`] if the catalog cannot be read.
#[utoipa::path(
    get,
    path = "/api/v1/wal/segments",
    tag = "WAL",
    summary = "List cataloged WAL segments",
    description = "Returns every segment the monitor has recorded, in WAL order.",
    responses(
        (status = 200, description = "Segment list", body = WalSegmentListResponse),
        (status = 500, description = "Catalog unavailable", body = ErrorResponse),
    )
)]
pub async fn list_segments(State(state): State<AppState>) -> Result<impl IntoResponse, PitrError> {
    let segments: Vec<WalSegmentDto> = state
        .service
        .list_segments()
        .await?
        .into_iter()
        .map(WalSegmentDto::from)
        .collect();
    let total = segments.len();
    Ok(Json(WalSegmentListResponse { segments, total }))
}

/// `GET /wal/lsns` — List restorable positions.
///
/// # Errors
///
/// Returns [`PitrError`] if the catalog cannot be read.
#[utoipa::path(
    get,
    path = "/api/v1/wal/lsns",
    tag = "WAL",
    summary = "List segment start LSNs",
    description = "Returns the start LSN of every cataloged segment. Any of these can be passed as `target_lsn` to a restore.",
    responses(
        (status = 200, description = "LSN list", body = Vec<WalLsnDto>),
        (status = 500, description = "Catalog unavailable", body = ErrorResponse),
    )
)]
pub async fn list_lsns(State(state): State<AppState>) -> Result<impl IntoResponse, PitrError> {
    let lsns: Vec<WalLsnDto> = state
        .service
        .available_lsns()
        .await?
        .into_iter()
        .map(WalLsnDto::from)
        .collect();
    Ok(Json(lsns))
}

/// `POST /wal/sync` — Run one monitor tick now.
///
/// # Errors
///
/// Returns [`PitrError`] if the archive directory cannot be listed.
#[utoipa::path(
    post,
    path = "/api/v1/wal/sync",
    tag = "WAL",
    summary = "Synchronize the catalog",
    description = "Scans the archive directory once and upserts every WAL segment found.",
    responses(
        (status = 200, description = "Tick report", body = SyncResponse),
        (status = 500, description = "Archive unreadable", body = ErrorResponse),
    )
)]
pub async fn sync_now(State(state): State<AppState>) -> Result<impl IntoResponse, PitrError> {
    let report = state.service.sync_now().await?;
    Ok(Json(SyncResponse::from(report)))
}

/// WAL routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/wal/segments", get(list_segments))
        .route("/wal/lsns", get(list_lsns))
        .route("/wal/sync", post(sync_now))
}
