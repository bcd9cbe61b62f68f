//! Offline discourse-theme analysis.
//!
//! The batch reads a review corpus, clusters each film's discussion into
//! themes, scores how differently the two audiences distribute over those
//! themes, and writes the details file consumed by the serving process.
//! Everything downstream sorts on the output, so the whole pipeline is
//! deterministic for a fixed corpus and configuration.

pub mod corpus;
mod divergence;
pub(crate) mod kmeans;
pub(crate) mod tfidf;
pub(crate) mod tokenize;

pub use divergence::analyze_movie;

use chrono::Utc;
use rayon::prelude::*;
use tracing::info;
use uuid::Uuid;

use crate::details::{DetailsFile, DetailsRecord};

use self::corpus::ReviewCorpus;

/// Tuning knobs for the analysis batch. All of them feed determinism:
/// two runs with equal params and corpus produce equal output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalyzerParams {
    /// Base seed; mixed with each film's key hash.
    pub seed: u64,
    /// Upper bound on clusters per film.
    pub k_max: usize,
    /// Evidence floor: both audiences need at least this many usable
    /// reviews, otherwise the film gets no score.
    pub min_docs_per_side: usize,
    /// Cap on reviews considered per audience.
    pub max_docs_per_side: usize,
    /// Minimum document frequency for a term to enter the vocabulary.
    pub min_df: usize,
    pub max_iterations: usize,
    /// Salient terms reported per audience per cluster.
    pub top_terms: usize,
    /// Clusters below this share for both audiences are dropped.
    pub min_cluster_share: f64,
    /// Review count per side at which the volume factor saturates.
    pub reliability_saturation: usize,
}

impl Default for AnalyzerParams {
    fn default() -> Self {
        Self {
            seed: 42,
            k_max: 6,
            min_docs_per_side: 5,
            max_docs_per_side: 200,
            min_df: 2,
            max_iterations: 50,
            top_terms: 8,
            min_cluster_share: 0.05,
            reliability_saturation: 30,
        }
    }
}

/// Analyze every film in the corpus. Output order follows corpus order.
#[must_use]
pub fn run_batch(params: &AnalyzerParams, corpus: &ReviewCorpus) -> DetailsFile {
    let movies: Vec<DetailsRecord> = corpus
        .movies
        .par_iter()
        .map(|movie| DetailsRecord::from(&analyze_movie(params, movie)))
        .collect();

    let scored = movies.iter().filter(|record| record.score.is_some()).count();
    info!(
        total = movies.len(),
        scored,
        below_floor = movies.len() - scored,
        "discourse analysis batch complete"
    );

    DetailsFile {
        run_id: Uuid::new_v4(),
        generated_at: Utc::now(),
        seed: params.seed,
        movies,
    }
}
