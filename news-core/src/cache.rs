use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::CacheConfig;
use crate::error::ProviderError;
use crate::item::{dedupe, normalize, sample_items, Category, NewsItem};
use crate::provider::ProviderClient;
use crate::storage::{read_json_or_default, write_json_atomic};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct CacheState {
    items: Vec<NewsItem>,
    last_refresh: Option<DateTime<Utc>>,
}

/// Time-boxed cache over the last good deduplicated batch.
///
/// A refresh replaces the batch wholesale; a failed refresh leaves it
/// untouched and keeps serving it past its TTL. The built-in sample batch
/// is only ever returned when the cache itself is empty, and is never
/// stored.
#[derive(Clone)]
pub struct NewsCache {
    inner: Arc<RwLock<CacheState>>,
    path: Option<PathBuf>,
    ttl: Duration,
    category_page_size: usize,
    aggregate_page_size: usize,
    min_batch: usize,
    max_batch: usize,
}

impl NewsCache {
    pub fn in_memory(config: &CacheConfig) -> Self {
        Self::with_state(config, CacheState::default(), None)
    }

    pub async fn load_from(path: impl AsRef<Path>, config: &CacheConfig) -> Self {
        let path = path.as_ref().to_path_buf();
        let state: CacheState = read_json_or_default(&path).await;
        Self::with_state(config, state, Some(path))
    }

    fn with_state(config: &CacheConfig, state: CacheState, path: Option<PathBuf>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(state)),
            path,
            ttl: Duration::minutes(config.ttl_minutes),
            category_page_size: config.category_page_size,
            aggregate_page_size: config.aggregate_page_size,
            min_batch: config.min_batch,
            max_batch: config.max_batch,
        }
    }

    /// The cached batch as-is, without triggering a refresh.
    pub async fn snapshot(&self) -> Vec<NewsItem> {
        self.inner.read().await.items.clone()
    }

    pub async fn last_refresh(&self) -> Option<DateTime<Utc>> {
        self.inner.read().await.last_refresh
    }

    /// Returns the current batch, refreshing through the provider when
    /// the TTL has lapsed.
    pub async fn get_current(&self, provider: &ProviderClient) -> Vec<NewsItem> {
        {
            let state = self.inner.read().await;
            if Self::is_fresh(&state, Utc::now(), self.ttl) {
                return state.items.clone();
            }
        }

        // The write lock is held across the refresh so concurrent callers
        // do not fan out duplicate provider queries for the same cache.
        let mut state = self.inner.write().await;
        if Self::is_fresh(&state, Utc::now(), self.ttl) {
            return state.items.clone();
        }

        match self.fetch_batch(provider).await {
            Ok(batch) if !batch.is_empty() => {
                info!(count = batch.len(), "news cache refreshed");
                state.items = batch;
                state.last_refresh = Some(Utc::now());
                if let Some(path) = &self.path {
                    write_json_atomic(path, &*state).await;
                }
                state.items.clone()
            }
            Ok(_) => {
                warn!("provider returned an empty batch, keeping previous items");
                Self::fallback(&state)
            }
            Err(err) => {
                warn!(error = %err, "news refresh failed, keeping previous items");
                Self::fallback(&state)
            }
        }
    }

    fn is_fresh(state: &CacheState, now: DateTime<Utc>, ttl: Duration) -> bool {
        match state.last_refresh {
            Some(last) => now - last <= ttl && !state.items.is_empty(),
            None => false,
        }
    }

    fn fallback(state: &CacheState) -> Vec<NewsItem> {
        if state.items.is_empty() {
            sample_items()
        } else {
            state.items.clone()
        }
    }

    /// One full refresh pass: category rotation, then a broad aggregate
    /// top-up when the result is thin, capped at `max_batch`.
    async fn fetch_batch(&self, provider: &ProviderClient) -> Result<Vec<NewsItem>, ProviderError> {
        let now = Utc::now();
        let mut rejected = 0usize;
        let mut items = Vec::new();

        for category in Category::HEADLINE_ROTATION {
            let raws = provider
                .fetch_category(category, self.category_page_size)
                .await?;
            for raw in raws {
                match normalize(raw, category, now) {
                    Some(item) => items.push(item),
                    None => rejected += 1,
                }
            }
        }

        let mut items = dedupe(items);

        if items.len() < self.min_batch {
            match provider.fetch_headlines(self.aggregate_page_size).await {
                Ok(raws) => {
                    for raw in raws {
                        if items.len() >= self.max_batch {
                            break;
                        }
                        match normalize(raw, Category::General, now) {
                            Some(item) => {
                                // Merge new identities only; category
                                // results are never overwritten.
                                if !items.iter().any(|e| e.identity() == item.identity()) {
                                    items.push(item);
                                }
                            }
                            None => rejected += 1,
                        }
                    }
                }
                Err(err) => {
                    warn!(error = %err, "aggregate top-up query failed, keeping category results");
                }
            }
        }

        items.truncate(self.max_batch);

        if rejected > 0 {
            debug!(rejected, "dropped invalid provider records");
        }

        Ok(items)
    }
}
