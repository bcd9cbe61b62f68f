//! Deterministic filter/sort/pagination over a catalog snapshot.
//!
//! Every sort key carries a documented tie-break chain ending in the
//! record's snapshot index, so the ordering is total: two identical
//! queries against one snapshot return bit-identical slices.

use std::cmp::Ordering;
use std::str::FromStr;

use thiserror::Error;

use super::model::MovieRecord;
use super::store::CatalogSnapshot;

pub const DEFAULT_PAGE_SIZE: usize = 50;
pub const MAX_PAGE_SIZE: usize = 200;
pub const YEAR_FLOOR: i32 = 1900;
pub const YEAR_CEILING: i32 = 2100;

/// Fixed sort enumeration. Unknown keys are request errors, never
/// silently defaulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    VotesDesc,
    GapDesc,
    GapAsc,
    ImdbDesc,
    ImdbAsc,
    DoubanDesc,
    DoubanAsc,
    ScoreDesc,
    ScoreAsc,
    ReliabilityDesc,
    YearDesc,
    YearAsc,
}

impl SortKey {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::VotesDesc => "votes_desc",
            SortKey::GapDesc => "gap_desc",
            SortKey::GapAsc => "gap_asc",
            SortKey::ImdbDesc => "imdb_desc",
            SortKey::ImdbAsc => "imdb_asc",
            SortKey::DoubanDesc => "douban_desc",
            SortKey::DoubanAsc => "douban_asc",
            SortKey::ScoreDesc => "score_desc",
            SortKey::ScoreAsc => "score_asc",
            SortKey::ReliabilityDesc => "reliability_desc",
            SortKey::YearDesc => "year_desc",
            SortKey::YearAsc => "year_asc",
        }
    }
}

impl FromStr for SortKey {
    type Err = QueryError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "votes_desc" => Ok(SortKey::VotesDesc),
            "gap_desc" => Ok(SortKey::GapDesc),
            "gap_asc" => Ok(SortKey::GapAsc),
            "imdb_desc" => Ok(SortKey::ImdbDesc),
            "imdb_asc" => Ok(SortKey::ImdbAsc),
            "douban_desc" => Ok(SortKey::DoubanDesc),
            "douban_asc" => Ok(SortKey::DoubanAsc),
            "score_desc" => Ok(SortKey::ScoreDesc),
            "score_asc" => Ok(SortKey::ScoreAsc),
            "reliability_desc" => Ok(SortKey::ReliabilityDesc),
            "year_desc" => Ok(SortKey::YearDesc),
            "year_asc" => Ok(SortKey::YearAsc),
            other => Err(QueryError::UnknownSort(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    #[error("unknown sort key: {0}")]
    UnknownSort(String),
    #[error("year_min {min} is greater than year_max {max}")]
    InvertedYearRange { min: i32, max: i32 },
    #[error("year {0} is outside the plausible range 1900..=2100")]
    YearOutOfBounds(i32),
    #[error("page must be at least 1")]
    PageTooSmall,
    #[error("page_size must be within 1..=200")]
    PageSizeOutOfBounds,
    #[error("vote floors must be non-negative")]
    NegativeVoteFloor,
}

/// A validated-on-execute list request.
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    /// Case-insensitive substring match against the title.
    pub q: Option<String>,
    /// Case-insensitive exact match against the region.
    pub region: Option<String>,
    pub year_min: Option<i32>,
    pub year_max: Option<i32>,
    pub min_imdb_votes: i64,
    pub min_douban_votes: i64,
    /// `0.0` is the unset sentinel: the filter participates only when a
    /// caller explicitly asks for a positive floor, and then it excludes
    /// records with no reliability to compare.
    pub min_reliability: f64,
    pub sort: SortKey,
    pub page: usize,
    pub page_size: usize,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            q: None,
            region: None,
            year_min: None,
            year_max: None,
            min_imdb_votes: 0,
            min_douban_votes: 0,
            min_reliability: 0.0,
            sort: SortKey::default(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ListQuery {
    fn validate(&self) -> Result<(), QueryError> {
        if let (Some(min), Some(max)) = (self.year_min, self.year_max) {
            if min > max {
                return Err(QueryError::InvertedYearRange { min, max });
            }
        }

        for bound in [self.year_min, self.year_max].into_iter().flatten() {
            if !(YEAR_FLOOR..=YEAR_CEILING).contains(&bound) {
                return Err(QueryError::YearOutOfBounds(bound));
            }
        }

        if self.page == 0 {
            return Err(QueryError::PageTooSmall);
        }

        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(QueryError::PageSizeOutOfBounds);
        }

        if self.min_imdb_votes < 0 || self.min_douban_votes < 0 {
            return Err(QueryError::NegativeVoteFloor);
        }

        Ok(())
    }
}

/// One page of results plus the filtered set's cardinality.
#[derive(Debug)]
pub struct MoviePage<'a> {
    pub page: usize,
    pub page_size: usize,
    pub total: usize,
    pub items: Vec<&'a MovieRecord>,
}

/// Run a validated query against a snapshot.
///
/// Pagination beyond the last page yields empty `items` with the correct
/// `total`; it is not an error.
///
/// # Errors
/// Returns [`QueryError`] before touching a single record when the
/// request is malformed.
pub fn execute<'a>(
    snapshot: &'a CatalogSnapshot,
    query: &ListQuery,
) -> Result<MoviePage<'a>, QueryError> {
    query.validate()?;

    let q_lower = query
        .q
        .as_deref()
        .map(str::to_lowercase)
        .filter(|needle| !needle.is_empty());
    let region_lower = query
        .region
        .as_deref()
        .map(str::to_lowercase)
        .filter(|region| !region.is_empty());

    let mut matched: Vec<(usize, &MovieRecord)> = snapshot
        .movies()
        .iter()
        .enumerate()
        .filter(|(_, movie)| matches(movie, q_lower.as_deref(), region_lower.as_deref(), query))
        .collect();

    matched.sort_by(|a, b| compare(query.sort, a, b));

    let total = matched.len();
    let start = (query.page - 1).saturating_mul(query.page_size);
    let items = matched
        .into_iter()
        .skip(start)
        .take(query.page_size)
        .map(|(_, movie)| movie)
        .collect();

    Ok(MoviePage {
        page: query.page,
        page_size: query.page_size,
        total,
        items,
    })
}

fn matches(
    movie: &MovieRecord,
    q_lower: Option<&str>,
    region_lower: Option<&str>,
    query: &ListQuery,
) -> bool {
    if let Some(needle) = q_lower {
        if !movie.title.to_lowercase().contains(needle) {
            return false;
        }
    }

    if let Some(region) = region_lower {
        let matched = movie
            .region
            .as_deref()
            .is_some_and(|r| r.to_lowercase() == region);
        if !matched {
            return false;
        }
    }

    // A record without a year never matches a range filter.
    if let Some(min) = query.year_min {
        if !movie.year.is_some_and(|year| year >= min) {
            return false;
        }
    }
    if let Some(max) = query.year_max {
        if !movie.year.is_some_and(|year| year <= max) {
            return false;
        }
    }

    if movie.imdb_votes.unwrap_or(0) < query.min_imdb_votes {
        return false;
    }
    if movie.douban_votes.unwrap_or(0) < query.min_douban_votes {
        return false;
    }

    if query.min_reliability > 0.0
        && !movie
            .reliability()
            .is_some_and(|reliability| reliability >= query.min_reliability)
    {
        return false;
    }

    true
}

fn compare(sort: SortKey, a: &(usize, &MovieRecord), b: &(usize, &MovieRecord)) -> Ordering {
    let (index_a, movie_a) = *a;
    let (index_b, movie_b) = *b;

    let primary = match sort {
        SortKey::VotesDesc => Ordering::Equal,
        SortKey::GapDesc => desc_f64(movie_a.gap, movie_b.gap),
        SortKey::GapAsc => asc_f64(movie_a.gap, movie_b.gap),
        SortKey::ImdbDesc => desc_f64(movie_a.imdb_rating, movie_b.imdb_rating),
        SortKey::ImdbAsc => asc_f64(movie_a.imdb_rating, movie_b.imdb_rating),
        SortKey::DoubanDesc => desc_f64(movie_a.douban_rating, movie_b.douban_rating),
        SortKey::DoubanAsc => asc_f64(movie_a.douban_rating, movie_b.douban_rating),
        SortKey::ScoreDesc => desc_f64(movie_a.score(), movie_b.score()),
        SortKey::ScoreAsc => asc_f64(movie_a.score(), movie_b.score()),
        SortKey::ReliabilityDesc => desc_f64(movie_a.reliability(), movie_b.reliability()),
        SortKey::YearDesc => desc_i32(movie_a.year, movie_b.year),
        SortKey::YearAsc => asc_i32(movie_a.year, movie_b.year),
    };

    primary
        .then_with(|| votes_then_title(movie_a, movie_b))
        .then_with(|| index_a.cmp(&index_b))
}

/// The shared tie-break: combined votes descending, then title ascending.
fn votes_then_title(a: &MovieRecord, b: &MovieRecord) -> Ordering {
    b.combined_votes()
        .cmp(&a.combined_votes())
        .then_with(|| a.title.cmp(&b.title))
}

// Null-last comparators: absent values sink to the end under both
// directions, and f64 uses a total order.

fn desc_f64(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn asc_f64(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn desc_i32(a: Option<i32>, b: Option<i32>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn asc_i32(a: Option<i32>, b: Option<i32>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
