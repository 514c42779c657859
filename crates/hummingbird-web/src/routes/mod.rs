mod auth_handlers;
mod pages;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_governor::{governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer};

use crate::state::AppState;

/// Page and login routes. `/login` is rate limited per client IP unless
/// `login_requests_per_minute` is zero.
pub fn router(login_requests_per_minute: u32) -> Router<AppState> {
    let login_routes = Router::new().route(
        "/login",
        get(auth_handlers::login_page).post(auth_handlers::login),
    );

    Router::new()
        .route("/", get(pages::index))
        .route("/logout", get(auth_handlers::logout))
        .merge(rate_limited(login_routes, login_requests_per_minute))
}

fn rate_limited(router: Router<AppState>, requests_per_minute: u32) -> Router<AppState> {
    if requests_per_minute == 0 {
        return router;
    }

    let period_per_request = (60 / requests_per_minute).max(1);
    let governor_config = GovernorConfigBuilder::default()
        .per_second(period_per_request.into())
        .burst_size(requests_per_minute)
        .key_extractor(SmartIpKeyExtractor)
        .finish();

    match governor_config {
        Some(config) => {
            router.layer(GovernorLayer::<_, _, axum::body::Body>::new(Arc::new(config)))
        }
        None => {
            tracing::warn!("Invalid login rate limit ({requests_per_minute}/min); rate limiting disabled");
            router
        }
    }
}
