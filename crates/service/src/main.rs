//! Lanch Sync - warehouse-to-marketplace inventory synchronization.
//!
//! This binary serves the sync API on port 5000.
//!
//! # Architecture
//!
//! - Axum web framework
//! - Logi GraphQL feed as the stock source of truth
//! - MercadoLibre Items API for listing stock and Flex enrollment
//! - Shopify Admin API for the online store's inventory level

#![cfg_attr(not(test), forbid(unsafe_code))]

use axum::{Router, routing::get};

use lanch_sync_service::{config::Config, routes, state::AppState};

#[tokio::main]
async fn main() {
    // Local development reads config/.env; deployed environments inject
    // real variables
    let _ = dotenvy::from_path("config/.env");

    // Defaults to info level for our crate if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "lanch_sync_service=info,tower_http=debug".into());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let config = Config::from_env().expect("Failed to load configuration");
    let addr = std::net::SocketAddr::new(config.host, config.port);

    let state = AppState::new(config);

    // Feed token renewal runs for the life of the process
    let _renewal = state.logi().spawn_token_renewal();

    let app = Router::new()
        .route("/health", get(health))
        .merge(routes::router(state));

    tracing::info!("lanch-sync listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
