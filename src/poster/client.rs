//! Poster scrape client.
//!
//! Resolves a poster URL from a film's IMDb title page by reading the
//! `og:image` meta tag. The client owes its caller a clean verdict:
//! `Found`/`NotFound` are definitive and cacheable forever, while every
//! `Err` is transient and must never be cached. Retryable trouble (429,
//! 5xx, connect errors, timeouts) is retried internally with backoff
//! before it surfaces.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep};
use tracing::{debug, warn};

use crate::config::Config;
use crate::util::retry::{RetryConfig, is_retryable_error, is_retryable_status};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/143.0.0.0 Safari/537.36";

/// A definitive answer from the upstream poster source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScrapeOutcome {
    Found(String),
    NotFound,
}

/// Transient failure. By construction every error from the client may be
/// retried later; definitive negatives come back as
/// [`ScrapeOutcome::NotFound`].
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("poster request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("poster upstream returned {0}")]
    Status(reqwest::StatusCode),
    #[error("poster page body unreadable: {0}")]
    Body(String),
}

#[async_trait]
pub trait PosterSource: Send + Sync {
    async fn resolve(&self, imdb_id: &str) -> Result<ScrapeOutcome, ScrapeError>;
}

/// Knobs for [`HttpPosterSource`], split out so tests can point the
/// client at a mock upstream with a flat retry schedule.
#[derive(Debug, Clone)]
pub struct PosterClientOptions {
    pub base_url: String,
    pub connect_timeout: Duration,
    pub total_timeout: Duration,
    pub min_request_interval: Duration,
    pub max_retries: usize,
    pub backoff_base_ms: u64,
    pub backoff_cap_ms: u64,
}

impl PosterClientOptions {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            base_url: config.poster_base_url().to_string(),
            connect_timeout: config.poster_connect_timeout(),
            total_timeout: config.poster_total_timeout(),
            min_request_interval: config.poster_min_request_interval(),
            max_retries: config.http_max_retries(),
            backoff_base_ms: config.http_backoff_base_ms(),
            backoff_cap_ms: config.http_backoff_cap_ms(),
        }
    }
}

/// Rate-limited, retrying HTTP implementation.
pub struct HttpPosterSource {
    http: reqwest::Client,
    base_url: String,
    retry: RetryConfig,
    min_request_interval: Duration,
    last_request: Mutex<Instant>,
}

impl HttpPosterSource {
    /// Build the client.
    ///
    /// # Errors
    /// Returns an error when the underlying HTTP client cannot be built.
    pub fn new(options: PosterClientOptions) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .connect_timeout(options.connect_timeout)
            .timeout(options.total_timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            http,
            base_url: options.base_url.trim_end_matches('/').to_string(),
            retry: RetryConfig::new(
                options.max_retries.max(1),
                options.backoff_base_ms,
                options.backoff_cap_ms,
            ),
            min_request_interval: options.min_request_interval,
            last_request: Mutex::new(Instant::now() - options.min_request_interval),
        })
    }

    /// Space outbound requests so a cold cache cannot hammer the
    /// upstream. Only the pacing window holds the lock; the request
    /// itself runs unguarded.
    async fn pace(&self) {
        let mut last = self.last_request.lock().await;
        let wait = self.min_request_interval.saturating_sub(last.elapsed());
        if !wait.is_zero() {
            sleep(wait).await;
        }
        *last = Instant::now();
    }

    async fn attempt(&self, url: &str) -> Result<ScrapeOutcome, ScrapeError> {
        self.pace().await;

        let response = self.http.get(url).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND || status == reqwest::StatusCode::GONE {
            return Ok(ScrapeOutcome::NotFound);
        }
        if !status.is_success() {
            return Err(ScrapeError::Status(status));
        }

        let body = response
            .text()
            .await
            .map_err(|error| ScrapeError::Body(error.to_string()))?;

        Ok(match extract_poster_url(&body) {
            Some(url) => ScrapeOutcome::Found(url),
            // The page exists and carries no poster: a real answer.
            None => ScrapeOutcome::NotFound,
        })
    }
}

#[async_trait]
impl PosterSource for HttpPosterSource {
    async fn resolve(&self, imdb_id: &str) -> Result<ScrapeOutcome, ScrapeError> {
        let url = format!("{}/title/{}/", self.base_url, imdb_id.trim());

        let mut attempt = 0;
        loop {
            let delay = self.retry.delay_for_attempt(attempt);
            if !delay.is_zero() {
                sleep(delay).await;
            }

            match self.attempt(&url).await {
                Ok(outcome) => {
                    debug!(imdb_id, attempt, found = matches!(outcome, ScrapeOutcome::Found(_)), "poster scrape resolved");
                    return Ok(outcome);
                }
                Err(error) => {
                    let retryable = match &error {
                        ScrapeError::Request(inner) => is_retryable_error(inner),
                        ScrapeError::Status(status) => is_retryable_status(*status),
                        ScrapeError::Body(_) => true,
                    };

                    attempt += 1;
                    if retryable && self.retry.can_retry(attempt) {
                        warn!(imdb_id, attempt, %error, "poster scrape attempt failed, retrying");
                        continue;
                    }
                    return Err(error);
                }
            }
        }
    }
}

/// Pull the `og:image` URL out of a title page. Parsing happens in one
/// synchronous scope so the non-`Send` DOM never crosses an await.
fn extract_poster_url(html: &str) -> Option<String> {
    let document = scraper::Html::parse_document(html);
    let selector = scraper::Selector::parse(r#"meta[property="og:image"]"#).ok()?;

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("content"))
        .map(str::trim)
        .find(|content| !content.is_empty())
        .map(str::to_string)
}
