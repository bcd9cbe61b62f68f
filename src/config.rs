use std::{env, net::SocketAddr, time::Duration};

use thiserror::Error;

use crate::analyzer::AnalyzerParams;

#[cfg(test)]
use once_cell::sync::Lazy;
#[cfg(test)]
pub(crate) static ENV_MUTEX: Lazy<std::sync::Mutex<()>> = Lazy::new(|| std::sync::Mutex::new(()));

/// Serving-process configuration, read once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    http_bind: SocketAddr,
    movies_csv: String,
    details_path: Option<String>,
    frontend_origin: Option<String>,
    poster_base_url: String,
    poster_connect_timeout: Duration,
    poster_total_timeout: Duration,
    poster_min_request_interval: Duration,
    http_max_retries: usize,
    http_backoff_base_ms: u64,
    http_backoff_cap_ms: u64,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variable: {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: {source}")]
    Invalid {
        name: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl Config {
    /// Load and validate the serving configuration from the environment.
    ///
    /// # Errors
    /// Returns [`ConfigError`] when `MOVIES_CSV` is unset or any value
    /// fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let movies_csv = env_var("MOVIES_CSV")?;
        let http_bind = parse_socket_addr("GAPLENS_HTTP_BIND", "0.0.0.0:9105")?;
        let details_path = env::var("DETAILS_PATH").ok();
        let frontend_origin = env::var("FRONTEND_ORIGIN").ok();

        // Poster scrape upstream
        let poster_base_url = env::var("POSTER_BASE_URL")
            .unwrap_or_else(|_| "https://www.imdb.com".to_string());
        let poster_connect_timeout = parse_duration_ms("POSTER_CONNECT_TIMEOUT_MS", 3000)?;
        let poster_total_timeout = parse_duration_ms("POSTER_TOTAL_TIMEOUT_MS", 15_000)?;
        let poster_min_request_interval =
            parse_duration_ms("POSTER_MIN_REQUEST_INTERVAL_MS", 1200)?;

        // Retry settings (exponential backoff + jitter)
        let http_max_retries = parse_usize("HTTP_MAX_RETRIES", 3)?;
        let http_backoff_base_ms = parse_u64("HTTP_BACKOFF_BASE_MS", 250)?;
        let http_backoff_cap_ms = parse_u64("HTTP_BACKOFF_CAP_MS", 10_000)?;

        Ok(Self {
            http_bind,
            movies_csv,
            details_path,
            frontend_origin,
            poster_base_url,
            poster_connect_timeout,
            poster_total_timeout,
            poster_min_request_interval,
            http_max_retries,
            http_backoff_base_ms,
            http_backoff_cap_ms,
        })
    }

    #[must_use]
    pub fn http_bind(&self) -> SocketAddr {
        self.http_bind
    }

    #[must_use]
    pub fn movies_csv(&self) -> &str {
        &self.movies_csv
    }

    #[must_use]
    pub fn details_path(&self) -> Option<&str> {
        self.details_path.as_deref()
    }

    #[must_use]
    pub fn frontend_origin(&self) -> Option<&str> {
        self.frontend_origin.as_deref()
    }

    #[must_use]
    pub fn poster_base_url(&self) -> &str {
        &self.poster_base_url
    }

    #[must_use]
    pub fn poster_connect_timeout(&self) -> Duration {
        self.poster_connect_timeout
    }

    #[must_use]
    pub fn poster_total_timeout(&self) -> Duration {
        self.poster_total_timeout
    }

    #[must_use]
    pub fn poster_min_request_interval(&self) -> Duration {
        self.poster_min_request_interval
    }

    #[must_use]
    pub fn http_max_retries(&self) -> usize {
        self.http_max_retries
    }

    #[must_use]
    pub fn http_backoff_base_ms(&self) -> u64 {
        self.http_backoff_base_ms
    }

    #[must_use]
    pub fn http_backoff_cap_ms(&self) -> u64 {
        self.http_backoff_cap_ms
    }
}

/// Batch-analyzer configuration, read by `gaplens-analyze`.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzerSettings {
    corpus_path: String,
    output_path: String,
    params: AnalyzerParams,
}

impl AnalyzerSettings {
    /// Load the batch configuration from the environment.
    ///
    /// # Errors
    /// Returns [`ConfigError`] when `CORPUS_PATH` or `DETAILS_OUT` is unset
    /// or any tuning knob fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let corpus_path = env_var("CORPUS_PATH")?;
        let output_path = env_var("DETAILS_OUT")?;

        let defaults = AnalyzerParams::default();
        let params = AnalyzerParams {
            seed: parse_u64("ANALYZER_SEED", defaults.seed)?,
            k_max: parse_usize("ANALYZER_K_MAX", defaults.k_max)?,
            min_docs_per_side: parse_usize(
                "ANALYZER_MIN_DOCS_PER_SIDE",
                defaults.min_docs_per_side,
            )?,
            max_docs_per_side: parse_usize(
                "ANALYZER_MAX_DOCS_PER_SIDE",
                defaults.max_docs_per_side,
            )?,
            min_df: parse_usize("ANALYZER_MIN_DF", defaults.min_df)?,
            max_iterations: parse_usize("ANALYZER_MAX_ITERATIONS", defaults.max_iterations)?,
            top_terms: parse_usize("ANALYZER_TOP_TERMS", defaults.top_terms)?,
            min_cluster_share: parse_f64("ANALYZER_MIN_CLUSTER_SHARE", defaults.min_cluster_share)?,
            reliability_saturation: parse_usize(
                "ANALYZER_RELIABILITY_SATURATION",
                defaults.reliability_saturation,
            )?,
        };

        if params.min_cluster_share < 0.0 || params.min_cluster_share > 1.0 {
            return Err(ConfigError::Invalid {
                name: "ANALYZER_MIN_CLUSTER_SHARE",
                source: anyhow::anyhow!("share floor must be within 0.0..=1.0"),
            });
        }

        Ok(Self {
            corpus_path,
            output_path,
            params,
        })
    }

    #[must_use]
    pub fn corpus_path(&self) -> &str {
        &self.corpus_path
    }

    #[must_use]
    pub fn output_path(&self) -> &str {
        &self.output_path
    }

    #[must_use]
    pub fn params(&self) -> &AnalyzerParams {
        &self.params
    }
}

fn env_var(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::Missing(name))
}

fn parse_socket_addr(name: &'static str, default: &str) -> Result<SocketAddr, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());

    raw.parse().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })
}

fn parse_duration_ms(name: &'static str, default_ms: u64) -> Result<Duration, ConfigError> {
    let ms = parse_u64(name, default_ms)?;
    Ok(Duration::from_millis(ms))
}

fn parse_usize(name: &'static str, default: usize) -> Result<usize, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.parse::<usize>().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })
}

fn parse_u64(name: &'static str, default: u64) -> Result<u64, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.parse::<u64>().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })
}

fn parse_f64(name: &'static str, default: f64) -> Result<f64, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.parse::<f64>().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_env(name: &str, value: &str) {
        // SAFETY: tests hold ENV_MUTEX and assign valid UTF-8 values.
        unsafe {
            env::set_var(name, value);
        }
    }

    fn remove_env(name: &str) {
        // SAFETY: tests hold ENV_MUTEX and remove deterministic keys.
        unsafe {
            env::remove_var(name);
        }
    }

    fn reset_env() {
        remove_env("MOVIES_CSV");
        remove_env("GAPLENS_HTTP_BIND");
        remove_env("DETAILS_PATH");
        remove_env("FRONTEND_ORIGIN");
        remove_env("POSTER_BASE_URL");
        remove_env("POSTER_CONNECT_TIMEOUT_MS");
        remove_env("POSTER_TOTAL_TIMEOUT_MS");
        remove_env("POSTER_MIN_REQUEST_INTERVAL_MS");
        remove_env("HTTP_MAX_RETRIES");
        remove_env("HTTP_BACKOFF_BASE_MS");
        remove_env("HTTP_BACKOFF_CAP_MS");
        remove_env("CORPUS_PATH");
        remove_env("DETAILS_OUT");
        remove_env("ANALYZER_SEED");
        remove_env("ANALYZER_MIN_CLUSTER_SHARE");
    }

    #[test]
    fn from_env_uses_defaults_when_optional_missing() {
        let _lock = ENV_MUTEX.lock().expect("env mutex");
        reset_env();
        set_env("MOVIES_CSV", "data/movies.csv");

        let config = Config::from_env().expect("config loads");

        assert_eq!(config.movies_csv(), "data/movies.csv");
        assert_eq!(config.http_bind().port(), 9105);
        assert_eq!(config.details_path(), None);
        assert_eq!(config.poster_base_url(), "https://www.imdb.com");
        assert_eq!(config.http_max_retries(), 3);
        assert_eq!(
            config.poster_min_request_interval(),
            Duration::from_millis(1200)
        );
    }

    #[test]
    fn from_env_requires_movies_csv() {
        let _lock = ENV_MUTEX.lock().expect("env mutex");
        reset_env();

        let error = Config::from_env().expect_err("must fail without dataset path");
        assert!(matches!(error, ConfigError::Missing("MOVIES_CSV")));
    }

    #[test]
    fn from_env_rejects_bad_bind_address() {
        let _lock = ENV_MUTEX.lock().expect("env mutex");
        reset_env();
        set_env("MOVIES_CSV", "data/movies.csv");
        set_env("GAPLENS_HTTP_BIND", "not-an-address");

        let error = Config::from_env().expect_err("must reject malformed bind");
        assert!(matches!(
            error,
            ConfigError::Invalid {
                name: "GAPLENS_HTTP_BIND",
                ..
            }
        ));
    }

    #[test]
    fn analyzer_settings_require_paths() {
        let _lock = ENV_MUTEX.lock().expect("env mutex");
        reset_env();

        let error = AnalyzerSettings::from_env().expect_err("must fail without corpus");
        assert!(matches!(error, ConfigError::Missing("CORPUS_PATH")));
    }

    #[test]
    fn analyzer_settings_apply_overrides() {
        let _lock = ENV_MUTEX.lock().expect("env mutex");
        reset_env();
        set_env("CORPUS_PATH", "corpus.json");
        set_env("DETAILS_OUT", "details.json");
        set_env("ANALYZER_SEED", "7");

        let settings = AnalyzerSettings::from_env().expect("settings load");
        assert_eq!(settings.params().seed, 7);
        assert_eq!(settings.corpus_path(), "corpus.json");
    }

    #[test]
    fn analyzer_settings_reject_out_of_range_share_floor() {
        let _lock = ENV_MUTEX.lock().expect("env mutex");
        reset_env();
        set_env("CORPUS_PATH", "corpus.json");
        set_env("DETAILS_OUT", "details.json");
        set_env("ANALYZER_MIN_CLUSTER_SHARE", "1.5");

        let error = AnalyzerSettings::from_env().expect_err("must reject bad share floor");
        assert!(matches!(
            error,
            ConfigError::Invalid {
                name: "ANALYZER_MIN_CLUSTER_SHARE",
                ..
            }
        ));
    }
}
