//! Discourse-analysis output: the details side table and its file format.
//!
//! The analyzer batch writes a [`DetailsFile`]; the serving process loads
//! it into a [`DetailsStore`] keyed by `movie_key`. The file is the only
//! channel between the two processes.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail, ensure};
use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Score and reliability always travel together (a movie either has a
/// measured divergence or it does not).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DivergenceOutcome {
    /// Discussion-divergence magnitude, 0–100.
    pub score: f64,
    /// Confidence in the score given evidence volume and stability, 0–1.
    pub reliability: f64,
}

/// One discussion theme with per-audience shares and salient terms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThemeCluster {
    /// Unique within a movie; assigned in descending order of total mass.
    pub cluster_id: u32,
    /// Share of IMDb discussion volume assigned to this cluster, 0–1.
    pub imdb_share: f64,
    /// Share of Douban discussion volume assigned to this cluster, 0–1.
    pub douban_share: f64,
    /// `douban_share - imdb_share`.
    pub share_gap: f64,
    /// Most salient IMDb terms, strongest first.
    pub imdb_terms: Vec<String>,
    /// Most salient Douban terms, strongest first.
    pub douban_terms: Vec<String>,
}

/// Validated analytics for one analyzed movie.
#[derive(Debug, Clone, PartialEq)]
pub struct MovieDetails {
    pub movie_key: String,
    pub imdb_id: Option<String>,
    /// `None` when the movie was selected for analysis but had too little
    /// evidence; such a movie behaves like a standard entry downstream.
    pub outcome: Option<DivergenceOutcome>,
    pub themes: Vec<ThemeCluster>,
}

/// On-disk shape of one analyzed movie. Unlike [`MovieDetails`] the score
/// pairing is not structural here, so conversion validates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailsRecord {
    pub movie_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imdb_id: Option<String>,
    pub score: Option<f64>,
    pub reliability: Option<f64>,
    #[serde(default)]
    pub themes: Vec<ThemeCluster>,
}

impl DetailsRecord {
    fn into_details(self) -> Result<MovieDetails> {
        let outcome = match (self.score, self.reliability) {
            (Some(score), Some(reliability)) => {
                ensure!(
                    (0.0..=100.0).contains(&score),
                    "movie {}: score {score} outside 0..=100",
                    self.movie_key
                );
                ensure!(
                    (0.0..=1.0).contains(&reliability),
                    "movie {}: reliability {reliability} outside 0..=1",
                    self.movie_key
                );
                Some(DivergenceOutcome { score, reliability })
            }
            (None, None) => None,
            _ => bail!(
                "movie {}: score and reliability must be present together",
                self.movie_key
            ),
        };

        Ok(MovieDetails {
            movie_key: self.movie_key,
            imdb_id: self.imdb_id,
            outcome,
            themes: self.themes,
        })
    }
}

impl From<&MovieDetails> for DetailsRecord {
    fn from(details: &MovieDetails) -> Self {
        Self {
            movie_key: details.movie_key.clone(),
            imdb_id: details.imdb_id.clone(),
            score: details.outcome.map(|o| o.score),
            reliability: details.outcome.map(|o| o.reliability),
            themes: details.themes.clone(),
        }
    }
}

/// The analyzer batch output as written to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailsFile {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    /// Seed the batch ran under; echoed for reproducibility.
    pub seed: u64,
    pub movies: Vec<DetailsRecord>,
}

impl DetailsFile {
    /// Read and parse a details file.
    ///
    /// # Errors
    /// Returns an error when the file is unreadable or not valid JSON.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read details file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse details file {}", path.display()))
    }

    /// Write atomically: serialize next to the target, then rename over it.
    ///
    /// # Errors
    /// Returns an error on serialization or filesystem failure.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let payload =
            serde_json::to_vec_pretty(self).context("failed to serialize details file")?;

        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        fs::write(&tmp, payload)
            .with_context(|| format!("failed to write details file {}", path.display()))?;
        fs::rename(&tmp, path)
            .with_context(|| format!("failed to publish details file {}", path.display()))
    }

    /// Validate every record and index by key.
    ///
    /// # Errors
    /// Returns an error on a broken score/reliability pairing, an
    /// out-of-range value, or a duplicate key.
    pub fn into_store(self) -> Result<DetailsStore> {
        DetailsStore::from_details(
            self.movies
                .into_iter()
                .map(DetailsRecord::into_details)
                .collect::<Result<Vec<_>>>()?,
        )
    }
}

/// In-memory details lookup, published as part of the catalog snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetailsStore {
    by_key: FxHashMap<String, MovieDetails>,
}

impl DetailsStore {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a store from validated details.
    ///
    /// # Errors
    /// Returns an error when two movies share a key.
    pub fn from_details(movies: Vec<MovieDetails>) -> Result<Self> {
        let mut by_key = FxHashMap::default();
        for details in movies {
            let key = details.movie_key.clone();
            if by_key.insert(key.clone(), details).is_some() {
                bail!("duplicate movie_key in details: {key}");
            }
        }
        Ok(Self { by_key })
    }

    /// Load a details file and validate it into a store.
    ///
    /// # Errors
    /// Propagates [`DetailsFile::load`] and [`DetailsFile::into_store`]
    /// failures.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        DetailsFile::load(path)?.into_store()
    }

    #[must_use]
    pub fn get(&self, movie_key: &str) -> Option<&MovieDetails> {
        self.by_key.get(movie_key)
    }

    #[must_use]
    pub fn contains(&self, movie_key: &str) -> bool {
        self.by_key.contains_key(movie_key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}
