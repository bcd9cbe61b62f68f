//! Catalog records and their derived fields.

use crate::details::DivergenceOutcome;

/// One film as parsed from the dataset, before derivation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MovieSeed {
    pub title: String,
    pub year: Option<i32>,
    pub region: Option<String>,
    pub imdb_id: Option<String>,
    pub imdb_url: Option<String>,
    pub douban_id: Option<i64>,
    pub douban_url: Option<String>,
    pub imdb_rating: Option<f64>,
    pub imdb_votes: Option<i64>,
    pub douban_rating: Option<f64>,
    pub douban_votes: Option<i64>,
}

/// Discourse-analysis attachment. The pairing of score and reliability is
/// structural: either a movie has a full [`DivergenceOutcome`] or none.
#[derive(Debug, Clone, PartialEq)]
pub enum Analytics {
    /// Not selected into the analyzed subset.
    Standard,
    /// Selected; `outcome` is `None` when evidence was below the floor,
    /// in which case every filter and sort treats the movie as standard.
    Analyzed {
        movie_key: String,
        outcome: Option<DivergenceOutcome>,
    },
}

/// One film in a published snapshot. Immutable once built; `gap` is
/// derived exactly once here and never recomputed on read.
#[derive(Debug, Clone, PartialEq)]
pub struct MovieRecord {
    pub title: String,
    pub year: Option<i32>,
    pub region: Option<String>,
    pub imdb_id: Option<String>,
    pub imdb_url: Option<String>,
    pub douban_id: Option<i64>,
    pub douban_url: Option<String>,
    pub imdb_rating: Option<f64>,
    pub imdb_votes: Option<i64>,
    pub douban_rating: Option<f64>,
    pub douban_votes: Option<i64>,
    /// `douban_rating - imdb_rating`, present iff both ratings are.
    pub gap: Option<f64>,
    pub analytics: Analytics,
}

impl MovieRecord {
    /// Derive the record from a parsed seed and its analytics attachment.
    #[must_use]
    pub fn from_seed(seed: MovieSeed, analytics: Analytics) -> Self {
        let gap = match (seed.douban_rating, seed.imdb_rating) {
            (Some(douban), Some(imdb)) => Some(douban - imdb),
            _ => None,
        };

        Self {
            title: seed.title,
            year: seed.year,
            region: seed.region,
            imdb_id: seed.imdb_id,
            imdb_url: seed.imdb_url,
            douban_id: seed.douban_id,
            douban_url: seed.douban_url,
            imdb_rating: seed.imdb_rating,
            imdb_votes: seed.imdb_votes,
            douban_rating: seed.douban_rating,
            douban_votes: seed.douban_votes,
            gap,
            analytics,
        }
    }

    /// Combined vote mass across both audiences, missing counts as zero.
    #[must_use]
    pub fn combined_votes(&self) -> i64 {
        self.imdb_votes.unwrap_or(0) + self.douban_votes.unwrap_or(0)
    }

    #[must_use]
    pub fn movie_key(&self) -> Option<&str> {
        match &self.analytics {
            Analytics::Analyzed { movie_key, .. } => Some(movie_key),
            Analytics::Standard => None,
        }
    }

    #[must_use]
    pub fn score(&self) -> Option<f64> {
        match &self.analytics {
            Analytics::Analyzed {
                outcome: Some(outcome),
                ..
            } => Some(outcome.score),
            _ => None,
        }
    }

    #[must_use]
    pub fn reliability(&self) -> Option<f64> {
        match &self.analytics {
            Analytics::Analyzed {
                outcome: Some(outcome),
                ..
            } => Some(outcome.reliability),
            _ => None,
        }
    }
}
