//! Review corpus input for the analysis batch.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Raw discussion text for one film, split by audience.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieReviews {
    pub imdb_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub imdb_reviews: Vec<String>,
    #[serde(default)]
    pub douban_reviews: Vec<String>,
}

/// The films selected into the analyzed subset. Selection policy (vote
/// floors, gap magnitude, editorial picks) lives in whatever produced
/// this file; the analyzer takes the subset as given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewCorpus {
    pub movies: Vec<MovieReviews>,
}

impl ReviewCorpus {
    /// Read and parse a corpus file.
    ///
    /// # Errors
    /// Returns an error when the file is unreadable or not valid JSON.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read corpus {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse corpus {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn corpus_parses_with_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("temp corpus");
        file.write_all(
            br#"{"movies":[{"imdb_id":"tt0111161","imdb_reviews":["great"],"douban_reviews":[]}]}"#,
        )
        .expect("write corpus");

        let corpus = ReviewCorpus::load(file.path()).expect("corpus loads");
        assert_eq!(corpus.movies.len(), 1);
        assert_eq!(corpus.movies[0].title, None);
        assert!(corpus.movies[0].douban_reviews.is_empty());
    }

    #[test]
    fn malformed_corpus_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().expect("temp corpus");
        file.write_all(b"not json").expect("write corpus");
        assert!(ReviewCorpus::load(file.path()).is_err());
    }
}
