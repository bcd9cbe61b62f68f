pub(crate) mod admin;
pub(crate) mod health;
pub(crate) mod metrics;
pub(crate) mod movies;
pub(crate) mod posters;
pub(crate) mod themes;

use axum::{
    Router,
    http::{HeaderValue, Method},
    routing::{get, post},
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::app::AppState;

#[derive(Debug, Serialize)]
pub(crate) struct ErrorResponse {
    pub(crate) error: String,
}

pub(crate) fn router(state: AppState) -> Router {
    let cors = cors_layer(state.config().frontend_origin());

    Router::new()
        .route("/health/ready", get(health::ready))
        .route("/health/live", get(health::live))
        .route("/metrics", get(metrics::exporter))
        .route("/admin/reload", post(admin::reload_snapshot))
        .route("/v1/movies", get(movies::list_movies))
        .route("/v1/movies/{movie_key}/themes", get(themes::get_themes))
        .route("/v1/posters/{imdb_id}", get(posters::resolve_poster))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Allow the configured frontend origin; a missing or unparsable origin
/// falls back to a permissive layer, which suits local development.
fn cors_layer(frontend_origin: Option<&str>) -> CorsLayer {
    let methods = [Method::GET, Method::POST];

    match frontend_origin.map(str::parse::<HeaderValue>) {
        Some(Ok(origin)) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(methods)
            .allow_headers(Any),
        Some(Err(error)) => {
            warn!(%error, "invalid FRONTEND_ORIGIN, falling back to permissive CORS");
            CorsLayer::permissive()
        }
        None => CorsLayer::permissive(),
    }
}
