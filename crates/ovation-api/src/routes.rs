//! Router setup with all API routes and middleware.
//!
//! Configures the axum Router with CORS, tracing, compression, and all
//! endpoint handlers.

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Create the axum Router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    // CORS middleware: allow localhost origins on the configured port.
    let port = state.config.lock().map(|c| c.general.port).unwrap_or(3040);
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list([
            format!("http://127.0.0.1:{}", port)
                .parse::<HeaderValue>()
                .unwrap(),
            format!("http://localhost:{}", port)
                .parse::<HeaderValue>()
                .unwrap(),
        ]))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/kudos/run", post(handlers::run_batch))
        .route("/kudos/quota", get(handlers::quota_summary))
        .route("/kudos/eligible", get(handlers::eligible))
        .route(
            "/settings",
            get(handlers::get_settings).put(handlers::update_settings),
        )
        .route("/stats", get(handlers::stats_summary))
        .route("/stats/reset", post(handlers::reset_statistics))
        .route("/debug/feed/seed", post(handlers::debug_seed_feed))
        .route("/debug/limit-notice", post(handlers::debug_limit_notice))
        .route("/stream", get(handlers::stream))
        .layer(DefaultBodyLimit::max(64 * 1024))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server on the configured address.
///
/// Binds to 127.0.0.1 (localhost only) on the given port.
pub async fn start_server(
    port: u16,
    state: AppState,
) -> Result<(), ovation_core::error::OvationError> {
    let addr = format!("127.0.0.1:{}", port);

    let router = create_router(state);

    tracing::info!("Starting API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| ovation_core::error::OvationError::Api(format!("Failed to bind: {}", e)))?;

    axum::serve(listener, router)
        .await
        .map_err(|e| ovation_core::error::OvationError::Api(format!("Server error: {}", e)))?;

    Ok(())
}
