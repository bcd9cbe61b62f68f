use axum::{Json, extract::Query, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::ErrorResponse;
use crate::app::AppState;
use crate::catalog::model::MovieRecord;
use crate::catalog::query::{self, DEFAULT_PAGE_SIZE, ListQuery, QueryError, SortKey};

#[derive(Debug, Deserialize)]
pub(crate) struct ListParams {
    q: Option<String>,
    region: Option<String>,
    year_min: Option<i32>,
    year_max: Option<i32>,
    min_imdb_votes: Option<i64>,
    min_douban_votes: Option<i64>,
    min_reliability: Option<f64>,
    sort: Option<String>,
    page: Option<usize>,
    page_size: Option<usize>,
}

#[derive(Debug, Serialize)]
pub(crate) struct MovieItem {
    title: String,
    year: Option<i32>,
    region: Option<String>,
    imdb_id: Option<String>,
    imdb_url: Option<String>,
    douban_id: Option<i64>,
    douban_url: Option<String>,
    imdb_rating: Option<f64>,
    imdb_votes: Option<i64>,
    douban_rating: Option<f64>,
    douban_votes: Option<i64>,
    gap: Option<f64>,
    // Present only for analyzed films; their absence is how a consumer
    // tells a standard entry from an analyzed one.
    #[serde(skip_serializing_if = "Option::is_none")]
    movie_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reliability: Option<f64>,
}

impl From<&MovieRecord> for MovieItem {
    fn from(movie: &MovieRecord) -> Self {
        Self {
            title: movie.title.clone(),
            year: movie.year,
            region: movie.region.clone(),
            imdb_id: movie.imdb_id.clone(),
            imdb_url: movie.imdb_url.clone(),
            douban_id: movie.douban_id,
            douban_url: movie.douban_url.clone(),
            imdb_rating: movie.imdb_rating,
            imdb_votes: movie.imdb_votes,
            douban_rating: movie.douban_rating,
            douban_votes: movie.douban_votes,
            gap: movie.gap,
            movie_key: movie.movie_key().map(str::to_string),
            score: movie.score(),
            reliability: movie.reliability(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct MovieListResponse {
    page: usize,
    page_size: usize,
    total: usize,
    items: Vec<MovieItem>,
}

/// GET /v1/movies — validated filter/sort/pagination over the snapshot.
pub(crate) async fn list_movies(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<MovieListResponse>, (StatusCode, Json<ErrorResponse>)> {
    let metrics = state.telemetry().metrics_arc();
    let timer = metrics.list_query_duration.start_timer();

    let sort = match params.sort.as_deref() {
        None | Some("") => SortKey::default(),
        Some(raw) => raw
            .parse::<SortKey>()
            .map_err(|error| reject(&metrics, &error))?,
    };

    let list_query = ListQuery {
        q: params.q,
        region: params.region,
        year_min: params.year_min,
        year_max: params.year_max,
        min_imdb_votes: params.min_imdb_votes.unwrap_or(0),
        min_douban_votes: params.min_douban_votes.unwrap_or(0),
        min_reliability: params.min_reliability.unwrap_or(0.0),
        sort,
        page: params.page.unwrap_or(1),
        page_size: params.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
    };

    let snapshot = state.catalog().snapshot();
    let page = query::execute(&snapshot, &list_query)
        .map_err(|error| reject(&metrics, &error))?;

    metrics.list_queries.inc();
    debug!(
        total = page.total,
        page = page.page,
        sort = sort.as_str(),
        "catalog list query served"
    );

    let response = MovieListResponse {
        page: page.page,
        page_size: page.page_size,
        total: page.total,
        items: page.items.into_iter().map(MovieItem::from).collect(),
    };
    drop(timer);

    Ok(Json(response))
}

fn reject(
    metrics: &crate::observability::metrics::Metrics,
    error: &QueryError,
) -> (StatusCode, Json<ErrorResponse>) {
    metrics.list_query_rejections.inc();
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
}
