//! Snapshot publication: readers clone an `Arc`, refresh swaps the pointer.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};

use crate::details::DetailsStore;
use crate::util::text::movie_key;

use super::model::{Analytics, MovieRecord, MovieSeed};

/// One immutable, internally consistent view of the catalog. Records and
/// the details side table are published together, so a batch refresh is a
/// single pointer swap and a scan can never observe a half-applied update.
#[derive(Debug)]
pub struct CatalogSnapshot {
    movies: Vec<MovieRecord>,
    details: DetailsStore,
    built_at: DateTime<Utc>,
}

impl CatalogSnapshot {
    /// Join seeds with the details table and derive per-record fields.
    #[must_use]
    pub fn build(seeds: Vec<MovieSeed>, details: DetailsStore) -> Self {
        let movies = seeds
            .into_iter()
            .map(|seed| {
                let analytics = seed
                    .imdb_id
                    .as_deref()
                    .map(movie_key)
                    .and_then(|key| {
                        details.get(&key).map(|entry| Analytics::Analyzed {
                            movie_key: key,
                            outcome: entry.outcome,
                        })
                    })
                    .unwrap_or(Analytics::Standard);
                MovieRecord::from_seed(seed, analytics)
            })
            .collect();

        Self {
            movies,
            details,
            built_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::build(Vec::new(), DetailsStore::empty())
    }

    #[must_use]
    pub fn movies(&self) -> &[MovieRecord] {
        &self.movies
    }

    #[must_use]
    pub fn details(&self) -> &DetailsStore {
        &self.details
    }

    #[must_use]
    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.movies.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }

    /// Number of records carrying a full divergence outcome.
    #[must_use]
    pub fn analyzed_count(&self) -> usize {
        self.movies
            .iter()
            .filter(|movie| movie.score().is_some())
            .count()
    }
}

/// Shared handle to the current snapshot.
#[derive(Debug)]
pub struct CatalogStore {
    current: RwLock<Arc<CatalogSnapshot>>,
}

impl CatalogStore {
    #[must_use]
    pub fn new(snapshot: CatalogSnapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(snapshot)),
        }
    }

    /// Clone out the current snapshot; the read lock is released before
    /// the caller touches a single record.
    #[must_use]
    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        self.current
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Publish a freshly built snapshot. In-flight readers keep the `Arc`
    /// they already cloned.
    pub fn swap(&self, snapshot: CatalogSnapshot) {
        let mut guard = self
            .current
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *guard = Arc::new(snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::details::{DetailsFile, DetailsRecord};
    use chrono::Utc;
    use uuid::Uuid;

    fn seed(title: &str, imdb_id: Option<&str>) -> MovieSeed {
        MovieSeed {
            title: title.to_string(),
            imdb_id: imdb_id.map(str::to_string),
            imdb_rating: Some(7.0),
            douban_rating: Some(8.0),
            ..MovieSeed::default()
        }
    }

    fn details_for(imdb_id: &str, score: Option<f64>) -> DetailsStore {
        DetailsFile {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            seed: 1,
            movies: vec![DetailsRecord {
                movie_key: movie_key(imdb_id),
                imdb_id: Some(imdb_id.to_string()),
                score,
                reliability: score.map(|_| 0.5),
                themes: Vec::new(),
            }],
        }
        .into_store()
        .expect("details build")
    }

    #[test]
    fn build_joins_details_by_derived_key() {
        let snapshot = CatalogSnapshot::build(
            vec![seed("Analyzed", Some("tt0000001")), seed("Plain", None)],
            details_for("tt0000001", Some(55.0)),
        );

        let analyzed = &snapshot.movies()[0];
        assert_eq!(analyzed.movie_key(), Some(movie_key("tt0000001").as_str()));
        assert_eq!(analyzed.score(), Some(55.0));
        assert_eq!(analyzed.gap, Some(1.0));

        let plain = &snapshot.movies()[1];
        assert_eq!(plain.movie_key(), None);
        assert_eq!(snapshot.analyzed_count(), 1);
    }

    #[test]
    fn floored_details_attach_key_without_outcome() {
        let snapshot = CatalogSnapshot::build(
            vec![seed("Floored", Some("tt0000002"))],
            details_for("tt0000002", None),
        );

        let movie = &snapshot.movies()[0];
        assert!(movie.movie_key().is_some());
        assert_eq!(movie.score(), None);
        assert_eq!(snapshot.analyzed_count(), 0);
    }

    #[test]
    fn swap_replaces_snapshot_without_disturbing_readers() {
        let store = CatalogStore::new(CatalogSnapshot::build(
            vec![seed("First", None)],
            DetailsStore::empty(),
        ));

        let before = store.snapshot();
        store.swap(CatalogSnapshot::build(
            vec![seed("Second", None), seed("Third", None)],
            DetailsStore::empty(),
        ));
        let after = store.snapshot();

        assert_eq!(before.len(), 1);
        assert_eq!(after.len(), 2);
        assert_eq!(before.movies()[0].title, "First");
    }
}
