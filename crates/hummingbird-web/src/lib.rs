//! Hummingbird web server: login pages, session cookies and the camera
//! WebSocket, built on axum.

pub mod auth;
pub mod config;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod static_files;
pub mod ws;

use axum::middleware::from_fn;
use axum::routing::get;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Builds the full application router.
pub fn app(state: AppState) -> axum::Router {
    let acme_dir = state.config.static_files.acme_challenge_dir.clone();

    let base_router = axum::Router::new()
        .merge(routes::router(state.config.rate_limit.login_requests_per_minute))
        .merge(ws::router())
        .route("/static/{*path}", get(static_files::static_handler))
        .nest_service("/.well-known/acme-challenge", ServeDir::new(acme_dir));

    let base_router = if state.config.tls_enabled() {
        base_router.layer(from_fn(middleware::security_headers::security_headers_with_hsts))
    } else {
        base_router.layer(from_fn(middleware::security_headers::security_headers))
    };

    base_router
        .layer(RequestBodyLimitLayer::new(64 * 1024))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
