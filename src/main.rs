//! pitr-gateway server entry point.
//!
//! Starts the WAL monitor and the Axum HTTP server with REST and WebSocket
//! endpoints.

use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use axum::routing::get;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use pitr_gateway::api;
use pitr_gateway::app_state::AppState;
use pitr_gateway::archive::ArchiveDir;
use pitr_gateway::config::{CatalogBackend, LogFormat, PitrConfig};
use pitr_gateway::domain::EventBus;
use pitr_gateway::exec::{CommandExecutor, DockerExecutor};
use pitr_gateway::monitor::WalMonitor;
use pitr_gateway::persistence::{InMemoryCatalog, PostgresCatalog, WalCatalog};
use pitr_gateway::service::{BackupController, PitrService, RestoreOrchestrator};
use pitr_gateway::ws::handler::ws_handler;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = PitrConfig::from_env().context("failed to load configuration")?;
    init_tracing(config.log_format);
    tracing::info!(addr = %config.listen_addr, backend = ?config.catalog_backend, "starting pitr-gateway");

    // Catalog
    let catalog: Arc<dyn WalCatalog> = match config.catalog_backend {
        CatalogBackend::Postgres => {
            let catalog = PostgresCatalog::connect(&config.database)
                .await
                .context("failed to connect to catalog database")?;
            if config.run_migrations {
                catalog.migrate().await.context("failed to apply catalog migrations")?;
            }
            Arc::new(catalog)
        }
        CatalogBackend::Memory => Arc::new(InMemoryCatalog::new()),
    };

    // Domain and execution
    let event_bus = EventBus::new(config.event_bus_capacity);
    let executor: Arc<dyn CommandExecutor> = Arc::new(DockerExecutor::new());
    let archive = ArchiveDir::new(config.archive.wal_archive_dir.clone());

    // Services
    let monitor = Arc::new(WalMonitor::new(
        archive.clone(),
        Arc::clone(&catalog),
        event_bus.clone(),
    ));
    let backups = BackupController::new(Arc::clone(&executor), config.backup.clone(), event_bus.clone());
    let restores = RestoreOrchestrator::new(
        executor,
        backups.clone(),
        config.restore.clone(),
        archive,
        event_bus.clone(),
    );
    let service = Arc::new(PitrService::new(
        catalog,
        Arc::clone(&monitor),
        backups,
        restores,
        event_bus.clone(),
    ));

    let monitor_task = monitor.spawn(config.archive.monitor_interval());
    tracing::info!(
        dir = %config.archive.wal_archive_dir.display(),
        interval_secs = config.archive.monitor_interval_secs,
        "WAL monitor running"
    );

    let app_state = AppState { service, event_bus };

    let app = Router::new()
        .merge(api::build_router())
        .route("/ws", get(ws_handler));
    #[cfg(feature = "swagger-ui")]
    let app = {
        use utoipa::OpenApi;
        app.merge(
            utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", api::ApiDoc::openapi()),
        )
    };
    let app = app
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(app_state);

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    monitor_task.stop().await;
    tracing::info!("shutdown complete");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match format {
        LogFormat::Json => tracing_subscriber::fmt().with_env_filter(filter).json().init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
