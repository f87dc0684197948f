//! REST API layer: route handlers, DTOs, and router composition.
//!
//! Resource endpoints are mounted under `/api/v1`; `/health` sits at the
//! root.

pub mod dto;
pub mod handlers;

use axum::Router;
use utoipa::OpenApi;

use crate::app_state::AppState;

/// OpenAPI document for the control API.
#[derive(Debug, OpenApi)]
#[openapi(
    info(title = "pitr-gateway", description = "WAL catalog and point-in-time restore control API"),
    paths(
        handlers::system::health_handler,
        handlers::wal::list_segments,
        handlers::wal::list_lsns,
        handlers::wal::sync_now,
        handlers::backup::backup_status,
        handlers::backup::trigger_backup,
        handlers::restore::create_restore,
    ),
    tags(
        (name = "System", description = "Service health"),
        (name = "WAL", description = "Archived WAL catalog"),
        (name = "Backups", description = "Base backups of the primary"),
        (name = "Restores", description = "Point-in-time restores of the restore target"),
    )
)]
pub struct ApiDoc;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes())
}
