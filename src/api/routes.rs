//! Router construction and server startup.

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::catalog::CatalogClient;
use crate::config::Config;
use crate::store::{create_progress_store, SharedProgressStore};

use super::health;
use super::progress;

/// Shared application state.
pub struct AppState {
    /// Progress persistence
    pub store: SharedProgressStore,
    /// Course manager / course service client
    pub catalog: CatalogClient,
}

impl AppState {
    pub fn new(store: SharedProgressStore, catalog: CatalogClient) -> Self {
        Self { store, catalog }
    }
}

/// Build the HTTP router over `state`.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health).head(health::health))
        .route("/progress/:user", get(progress::get_user_progress))
        .route("/progress/:user/:course", get(progress::get_course_progress))
        .route(
            "/progress/:user/:course/:task",
            get(progress::get_task_progress).put(progress::put_task_progress),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let store = create_progress_store(config.store_type, &config.database_url).await?;
    tracing::info!(
        "Progress store ready ({}, {})",
        if store.is_persistent() { "sqlite" } else { "memory" },
        config.database_url
    );

    let catalog = CatalogClient::new(&config.catalog_url, config.catalog_timeout)?;
    tracing::info!(
        "Using course manager at {} (timeout {:?})",
        catalog.base_url(),
        config.catalog_timeout
    );

    let addr = format!("{}:{}", config.host, config.port);
    let state = Arc::new(AppState::new(store, catalog));
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Graceful shutdown complete");
    Ok(())
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

/// Serve `state` on an ephemeral local port and return its base URL.
#[cfg(test)]
pub(crate) async fn spawn_test_server(state: Arc<AppState>) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test server");
    let base = format!("http://{}", listener.local_addr().expect("local addr"));
    let app = router(state);
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("test server");
    });
    base
}
