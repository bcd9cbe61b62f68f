use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;

use crate::app::AppState;

#[derive(Debug, Serialize)]
pub(crate) struct PosterResponse {
    /// `null` covers both a definitive "no poster" and a transient
    /// failure; neither is an error to the caller.
    url: Option<String>,
}

/// GET /v1/posters/{imdb_id} — scrape-or-serve. Never fails: transient
/// trouble is absorbed by the cache and comes back as `null`.
pub(crate) async fn resolve_poster(
    State(state): State<AppState>,
    Path(imdb_id): Path<String>,
) -> Json<PosterResponse> {
    let url = state.poster_cache().lookup(&imdb_id).await;
    Json(PosterResponse { url })
}
