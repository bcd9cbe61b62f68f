//! Single-flight poster cache.
//!
//! Per `imdb_id` the entry walks `unresolved → resolving → {found |
//! not-found}`; the terminal states never change. Concurrent lookups for
//! one key attach to the in-flight resolution instead of scraping again,
//! and the resolution itself runs on a detached task so a caller that
//! gives up waiting never aborts the scrape other waiters need. A
//! transient failure removes the entry, so the next lookup retries.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use tokio::sync::{Mutex, watch};
use tracing::{debug, warn};

use crate::observability::metrics::Metrics;

use super::client::{PosterSource, ScrapeOutcome};

#[derive(Debug, Clone, PartialEq, Eq)]
enum ResolveResult {
    Found(String),
    NotFound,
    Transient,
}

enum Entry {
    /// Scrape in flight; waiters hold the receiver.
    Resolving(watch::Receiver<Option<ResolveResult>>),
    Found(String),
    NotFound,
}

struct CacheInner {
    entries: Mutex<FxHashMap<String, Entry>>,
    source: Arc<dyn PosterSource>,
    metrics: Arc<Metrics>,
}

/// Shared handle; clones are cheap and refer to the same cache.
#[derive(Clone)]
pub struct PosterCache {
    inner: Arc<CacheInner>,
}

impl PosterCache {
    #[must_use]
    pub fn new(source: Arc<dyn PosterSource>, metrics: Arc<Metrics>) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                entries: Mutex::new(FxHashMap::default()),
                source,
                metrics,
            }),
        }
    }

    /// Resolve a poster URL, scraping at most once per key at a time.
    ///
    /// `None` covers both the cached definitive "no poster" answer and a
    /// transient failure of the current resolution; only the former is
    /// remembered.
    pub async fn lookup(&self, imdb_id: &str) -> Option<String> {
        let timer = self.inner.metrics.poster_resolve_duration.start_timer();

        let mut receiver = {
            let mut entries = self.inner.entries.lock().await;
            match entries.get(imdb_id) {
                Some(Entry::Found(url)) => {
                    self.inner.metrics.poster_cache_hits.inc();
                    return Some(url.clone());
                }
                Some(Entry::NotFound) => {
                    self.inner.metrics.poster_cache_hits.inc();
                    return None;
                }
                Some(Entry::Resolving(receiver)) => receiver.clone(),
                None => {
                    let (sender, receiver) = watch::channel(None);
                    entries.insert(imdb_id.to_string(), Entry::Resolving(receiver.clone()));

                    let inner = Arc::clone(&self.inner);
                    let key = imdb_id.to_string();
                    // Detached: completion does not depend on this caller.
                    tokio::spawn(async move {
                        resolve_and_publish(inner, key, sender).await;
                    });

                    receiver
                }
            }
        };

        let result = match receiver.wait_for(Option::is_some).await {
            Ok(value) => value.clone(),
            // Resolver died without publishing; behave like a transient
            // failure and let a later lookup retry.
            Err(_) => Some(ResolveResult::Transient),
        };
        drop(timer);

        match result {
            Some(ResolveResult::Found(url)) => Some(url),
            _ => None,
        }
    }
}

async fn resolve_and_publish(
    inner: Arc<CacheInner>,
    key: String,
    sender: watch::Sender<Option<ResolveResult>>,
) {
    inner.metrics.poster_scrapes.inc();
    let outcome = inner.source.resolve(&key).await;

    let result = {
        let mut entries = inner.entries.lock().await;
        match outcome {
            Ok(ScrapeOutcome::Found(url)) => {
                entries.insert(key.clone(), Entry::Found(url.clone()));
                ResolveResult::Found(url)
            }
            Ok(ScrapeOutcome::NotFound) => {
                debug!(imdb_id = %key, "caching definitive poster not-found");
                entries.insert(key.clone(), Entry::NotFound);
                ResolveResult::NotFound
            }
            Err(error) => {
                warn!(imdb_id = %key, %error, "poster scrape failed transiently");
                inner.metrics.poster_transient_failures.inc();
                entries.remove(&key);
                ResolveResult::Transient
            }
        }
    };

    // Waiters read the final value even after the sender drops.
    let _ = sender.send(Some(result));
}
