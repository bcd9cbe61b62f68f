use prometheus::{
    Counter, Gauge, Histogram, Registry, register_counter_with_registry,
    register_gauge_with_registry, register_histogram_with_registry,
};

/// Metric families for the catalog API and the poster cache.
#[derive(Debug, Clone)]
pub struct Metrics {
    // Counters
    pub list_queries: Counter,
    pub list_query_rejections: Counter,
    pub poster_scrapes: Counter,
    pub poster_cache_hits: Counter,
    pub poster_transient_failures: Counter,
    pub snapshot_reloads: Counter,

    // Histograms
    pub list_query_duration: Histogram,
    pub poster_resolve_duration: Histogram,

    // Gauges
    pub catalog_movies: Gauge,
    pub catalog_analyzed: Gauge,
}

impl Metrics {
    /// Register every family into the given registry.
    ///
    /// # Errors
    /// Returns a [`prometheus::Error`] on duplicate or malformed names.
    pub fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        Ok(Self {
            list_queries: register_counter_with_registry!(
                "gaplens_list_queries_total",
                "Total number of catalog list queries executed",
                registry
            )?,
            list_query_rejections: register_counter_with_registry!(
                "gaplens_list_query_rejections_total",
                "Total number of catalog list queries rejected at validation",
                registry
            )?,
            poster_scrapes: register_counter_with_registry!(
                "gaplens_poster_scrapes_total",
                "Total number of outbound poster scrapes started",
                registry
            )?,
            poster_cache_hits: register_counter_with_registry!(
                "gaplens_poster_cache_hits_total",
                "Total number of poster lookups served from a terminal cache entry",
                registry
            )?,
            poster_transient_failures: register_counter_with_registry!(
                "gaplens_poster_transient_failures_total",
                "Total number of poster scrapes that failed transiently",
                registry
            )?,
            snapshot_reloads: register_counter_with_registry!(
                "gaplens_snapshot_reloads_total",
                "Total number of catalog snapshot reloads",
                registry
            )?,
            list_query_duration: register_histogram_with_registry!(
                "gaplens_list_query_duration_seconds",
                "Duration of catalog list query execution",
                registry
            )?,
            poster_resolve_duration: register_histogram_with_registry!(
                "gaplens_poster_resolve_duration_seconds",
                "Duration of poster resolution including upstream scrape",
                registry
            )?,
            catalog_movies: register_gauge_with_registry!(
                "gaplens_catalog_movies",
                "Number of movies in the published snapshot",
                registry
            )?,
            catalog_analyzed: register_gauge_with_registry!(
                "gaplens_catalog_analyzed",
                "Number of movies carrying discourse analytics in the published snapshot",
                registry
            )?,
        })
    }
}
