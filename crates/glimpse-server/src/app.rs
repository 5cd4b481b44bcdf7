use std::sync::Arc;

use axum::{
    http::HeaderValue,
    routing::{get, patch},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{routes, state::AppState};

/// Construct the Axum [`Router`] with all routes and middleware attached.
///
/// Middleware is applied in outer-to-inner order (outermost runs first on
/// request, last on response):
///
/// 1. `TraceLayer`: structured request/response logging via `tracing`.
/// 2. `CorsLayer`: the tracking beacon is requested from third-party pages.
///    An empty `GLIMPSE_CORS_ORIGINS` allows any origin.
pub fn build_app(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.cors_origins);
    Router::new()
        .route("/health", get(routes::health::health))
        .route("/analytics/track", get(routes::track::track))
        .route(
            "/apps",
            get(routes::apps::list_apps).post(routes::apps::create_app),
        )
        .route(
            "/apps/{tracking_id}",
            patch(routes::apps::update_app).delete(routes::apps::delete_app),
        )
        .route("/analytics/referrals", get(routes::analytics::referrals))
        .route("/analytics/pages", get(routes::analytics::pages))
        .route("/analytics/browsers", get(routes::analytics::browsers))
        .route("/analytics/countries", get(routes::analytics::countries))
        .route("/analytics/devices", get(routes::analytics::devices))
        .route("/analytics/os", get(routes::analytics::operating_systems))
        .route("/analytics/visitors", get(routes::analytics::visitors))
        .route("/analytics/pageviews", get(routes::analytics::page_views))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "ignoring unparseable CORS origin");
                None
            }
        })
        .collect();
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if allowed.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(AllowOrigin::list(allowed))
    }
}
