// keyline-server: HTTP surface for license activation, quota reset and admin.

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod state;

use std::sync::Arc;

use axum::Router;
use tower_http::trace::TraceLayer;

use keyline_api::DocumentStore;
use keyline_core::ServerConfig;

pub use error::ApiError;
pub use state::AppState;

/// The full application router with request tracing.
pub fn app(state: AppState) -> Router {
    handlers::router(state.clone())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until Ctrl-C.
pub async fn serve(store: Arc<dyn DocumentStore>, config: ServerConfig) -> std::io::Result<()> {
    if config.admin_token.is_none() {
        tracing::warn!("no admin token configured; admin routes are unauthenticated");
    }
    let state = AppState::new(store, &config);
    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    tracing::info!("keyline listening on {}", listener.local_addr()?);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to install Ctrl+C handler: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, stopping server...");
}
