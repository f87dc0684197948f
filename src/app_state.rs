//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::domain::EventBus;
use crate::service::PitrService;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Facade for every operator action.
    pub service: Arc<PitrService>,
    /// Event bus for WebSocket subscriptions.
    pub event_bus: EventBus,
}
