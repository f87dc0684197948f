//! REST endpoint handlers organized by resource.

pub mod backup;
pub mod restore;
pub mod system;
pub mod wal;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(wal::routes())
        .merge(backup::routes())
        .merge(restore::routes())
}
