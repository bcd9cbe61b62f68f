use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Serialize;

use crate::api::ErrorResponse;
use crate::app::AppState;
use crate::details::ThemeCluster;

#[derive(Debug, Serialize)]
pub(crate) struct ThemesResponse {
    movie_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reliability: Option<f64>,
    /// Empty when no cluster rose above significance; that is a valid
    /// answer, not an error.
    themes: Vec<ThemeCluster>,
}

/// GET /v1/movies/{movie_key}/themes
pub(crate) async fn get_themes(
    State(state): State<AppState>,
    Path(movie_key): Path<String>,
) -> Result<Json<ThemesResponse>, (StatusCode, Json<ErrorResponse>)> {
    let snapshot = state.catalog().snapshot();

    let Some(details) = snapshot.details().get(&movie_key) else {
        return Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("no analysis for movie_key {movie_key}"),
            }),
        ));
    };

    Ok(Json(ThemesResponse {
        movie_key: details.movie_key.clone(),
        score: details.outcome.map(|outcome| outcome.score),
        reliability: details.outcome.map(|outcome| outcome.reliability),
        themes: details.themes.clone(),
    }))
}
