use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use tracing::{info, warn};

use crate::api::ErrorResponse;
use crate::app::AppState;

#[derive(Debug, Serialize)]
pub(crate) struct ReloadReport {
    movies: usize,
    analyzed: usize,
}

/// POST /admin/reload — rebuild the snapshot from the dataset and details
/// files and swap it in atomically. On failure the current snapshot stays
/// published.
pub(crate) async fn reload_snapshot(State(state): State<AppState>) -> impl IntoResponse {
    match state.reload() {
        Ok((movies, analyzed)) => {
            info!(movies, analyzed, "catalog snapshot reloaded");
            (StatusCode::OK, Json(ReloadReport { movies, analyzed })).into_response()
        }
        Err(error) => {
            warn!(error = %format!("{error:#}"), "snapshot reload failed, keeping current snapshot");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "snapshot reload failed".to_string(),
                }),
            )
                .into_response()
        }
    }
}
