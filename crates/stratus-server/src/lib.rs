//! # Stratus Server
//!
//! The control API: a thin axum dispatcher over the catalog, placement,
//! engine, event bus, and auth components. Handlers authenticate, authorize,
//! deserialize, call one core operation, and serialize the result; business
//! logic lives in the component crates.

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};

pub use config::AppConfig;
pub use error::{ApiError, ApiResult, ErrorResponse};
pub use state::{refresh_catalog, AppState};

/// Build the application router.
///
/// `/auth/*` and `/health` are open; everything else sits behind the bearer
/// middleware with per-handler role gates.
pub fn build_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/auth/register", post(routes::auth::register))
        .route("/auth/login", post(routes::auth::login))
        .route("/health", get(routes::health::health));

    let protected = Router::new()
        .route("/catalog/objects", get(routes::catalog::list_objects))
        .route("/catalog/refresh", post(routes::catalog::refresh))
        .route(
            "/placement/recommendations",
            get(routes::placement::recommendations),
        )
        .route(
            "/placement/tier-distribution",
            get(routes::placement::tier_distribution),
        )
        .route(
            "/migrations",
            post(routes::migrations::create).get(routes::migrations::list),
        )
        .route(
            "/migrations/:id",
            get(routes::migrations::get).delete(routes::migrations::cancel),
        )
        .route("/events/recent", get(routes::events::recent))
        .route("/events/stream", get(routes::events::stream))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_bearer,
        ));

    let timeout = Duration::from_secs(state.config.server.request_timeout_secs);
    let cors = build_cors_layer(&state.config);

    public
        .merge(protected)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(timeout))
        .layer(cors)
}

fn build_cors_layer(config: &AppConfig) -> CorsLayer {
    use tower_http::cors::Any;

    if config.server.cors.allow_any_origin {
        return CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);
    }

    let origins: Vec<http::HeaderValue> = config
        .server
        .cors
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([http::Method::GET, http::Method::POST, http::Method::DELETE])
        .allow_headers([http::header::AUTHORIZATION, http::header::CONTENT_TYPE])
}
