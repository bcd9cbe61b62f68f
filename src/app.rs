use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tracing::warn;

use crate::{
    api,
    catalog::loader,
    catalog::store::{CatalogSnapshot, CatalogStore},
    config::Config,
    details::DetailsStore,
    observability::Telemetry,
    poster::{HttpPosterSource, PosterCache, PosterClientOptions},
};

#[derive(Clone)]
pub struct AppState {
    registry: Arc<ComponentRegistry>,
}

pub struct ComponentRegistry {
    config: Arc<Config>,
    telemetry: Telemetry,
    catalog: Arc<CatalogStore>,
    poster_cache: PosterCache,
}

impl AppState {
    pub(crate) fn new(registry: ComponentRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    pub(crate) fn config(&self) -> &Config {
        &self.registry.config
    }

    pub(crate) fn telemetry(&self) -> &Telemetry {
        &self.registry.telemetry
    }

    pub(crate) fn catalog(&self) -> &CatalogStore {
        &self.registry.catalog
    }

    pub(crate) fn poster_cache(&self) -> &PosterCache {
        &self.registry.poster_cache
    }

    pub(crate) fn reload(&self) -> Result<(usize, usize)> {
        self.registry.reload()
    }
}

impl ComponentRegistry {
    /// Load the dataset and details files, publish the first snapshot,
    /// and wire up the poster pipeline.
    ///
    /// # Errors
    /// Returns an error when telemetry, the dataset, the details file, or
    /// the HTTP client fails to initialize.
    pub fn build(config: Config) -> Result<Self> {
        let config = Arc::new(config);
        let telemetry = Telemetry::new()?;

        let snapshot = load_snapshot(&config)?;
        publish_gauges(&telemetry, &snapshot);
        let catalog = Arc::new(CatalogStore::new(snapshot));

        let source = HttpPosterSource::new(PosterClientOptions::from_config(&config))
            .context("failed to build poster scrape client")?;
        let poster_cache = PosterCache::new(Arc::new(source), telemetry.metrics_arc());

        Ok(Self {
            config,
            telemetry,
            catalog,
            poster_cache,
        })
    }

    /// Rebuild off to the side, then swap; readers never see a partial
    /// snapshot, and a failed rebuild leaves the current one published.
    ///
    /// # Errors
    /// Returns an error when either input file fails to load.
    pub fn reload(&self) -> Result<(usize, usize)> {
        let snapshot = load_snapshot(&self.config)?;
        let counts = (snapshot.len(), snapshot.analyzed_count());

        publish_gauges(&self.telemetry, &snapshot);
        self.telemetry.metrics().snapshot_reloads.inc();
        self.catalog.swap(snapshot);

        Ok(counts)
    }

    #[must_use]
    pub fn config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }
}

fn load_snapshot(config: &Config) -> Result<CatalogSnapshot> {
    let seeds = loader::load_csv(config.movies_csv())?;

    let details = match config.details_path() {
        Some(path) if std::path::Path::new(path).exists() => DetailsStore::load(path)?,
        Some(path) => {
            // No batch output yet is a normal state, not a startup error.
            warn!(path, "details file not found; serving catalog without analytics");
            DetailsStore::empty()
        }
        None => DetailsStore::empty(),
    };

    Ok(CatalogSnapshot::build(seeds, details))
}

fn publish_gauges(telemetry: &Telemetry, snapshot: &CatalogSnapshot) {
    let metrics = telemetry.metrics();
    metrics.catalog_movies.set(snapshot.len() as f64);
    metrics.catalog_analyzed.set(snapshot.analyzed_count() as f64);
}

pub fn build_router(registry: ComponentRegistry) -> Router {
    api::router(AppState::new(registry))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ENV_MUTEX;
    use std::io::Write;

    #[tokio::test]
    async fn component_registry_builds_from_a_dataset() {
        let mut dataset = tempfile::NamedTempFile::new().expect("temp dataset");
        dataset
            .write_all(
                b"title,year,region,imdb_id,imdb_url,douban_id,douban_url,imdb_rating,imdb_votes,douban_rating,douban_votes\n\
                  Example,1994,US,tt0000001,,,,7.0,100,8.0,200\n",
            )
            .expect("write dataset");

        let config = {
            let _lock = ENV_MUTEX.lock().expect("env mutex");
            // SAFETY: test holds ENV_MUTEX and assigns valid UTF-8 values.
            unsafe {
                std::env::set_var("MOVIES_CSV", dataset.path());
                std::env::remove_var("DETAILS_PATH");
                std::env::remove_var("FRONTEND_ORIGIN");
            }
            Config::from_env().expect("config loads")
        };

        let registry = ComponentRegistry::build(config).expect("registry builds");
        let state = AppState::new(registry);

        let snapshot = state.catalog().snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.movies()[0].gap, Some(1.0));

        let (movies, analyzed) = state.reload().expect("reload succeeds");
        assert_eq!(movies, 1);
        assert_eq!(analyzed, 0);
    }
}
