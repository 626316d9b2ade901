use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDate, Timelike, Utc};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::cache::NewsCache;
use crate::config::{AppConfig, DigestConfig};
use crate::digest;
use crate::error::{IndexError, ProviderError};
use crate::favorites::{FavoritesStore, SaveOutcome};
use crate::item::{dedupe, normalize, Category, NewsItem};
use crate::provider::ProviderClient;
use crate::subscriptions::{SubscriptionChange, SubscriptionRegistry};
use crate::views::ListViews;

/// One composed digest addressed to one subscriber, handed to the
/// transport layer for delivery.
#[derive(Debug, Clone)]
pub struct DigestMessage {
    pub user_id: i64,
    pub text: String,
}

/// The service object owning the provider and all four stores. Request
/// handlers hold a reference to this; there is no module-level state.
pub struct NewsService {
    provider: ProviderClient,
    cache: NewsCache,
    views: ListViews,
    favorites: FavoritesStore,
    subscriptions: SubscriptionRegistry,
    config: AppConfig,
}

impl NewsService {
    /// Opens the service with stores persisted under `data_dir`.
    pub async fn open(config: AppConfig, data_dir: impl AsRef<Path>) -> Result<Self, ProviderError> {
        let dir = data_dir.as_ref();
        let provider = ProviderClient::new(&config.provider)?;
        let cache = NewsCache::load_from(dir.join("news.json"), &config.cache).await;
        let views = ListViews::load_from(dir.join("views.json"), config.lists.retention_hours).await;
        let favorites = FavoritesStore::load_from(dir.join("favorites.json")).await;
        let subscriptions = SubscriptionRegistry::load_from(dir.join("subscriptions.json")).await;

        Ok(Self {
            provider,
            cache,
            views,
            favorites,
            subscriptions,
            config,
        })
    }

    /// Everything in memory; nothing touches disk. For tests and
    /// throwaway sessions.
    pub fn in_memory(config: AppConfig) -> Result<Self, ProviderError> {
        let provider = ProviderClient::new(&config.provider)?;
        Ok(Self {
            provider,
            cache: NewsCache::in_memory(&config.cache),
            views: ListViews::in_memory(config.lists.retention_hours),
            favorites: FavoritesStore::in_memory(),
            subscriptions: SubscriptionRegistry::in_memory(),
            config,
        })
    }

    /// The fresh-news list for a user: current batch minus items they
    /// already saved, capped at the list limit. Records the view.
    pub async fn latest_news(&self, user_id: i64) -> Vec<NewsItem> {
        let batch = self.cache.get_current(&self.provider).await;

        let mut shown = Vec::with_capacity(self.config.lists.news_limit);
        for item in batch {
            if shown.len() >= self.config.lists.news_limit {
                break;
            }
            if !self.favorites.contains(user_id, item.identity()).await {
                shown.push(item);
            }
        }

        self.views.record(user_id, shown.clone()).await;
        shown
    }

    /// Keyword search: cached items first, topped up from the provider
    /// when local matches are thin. Provider errors keep the local
    /// results. Records the view.
    pub async fn filtered_news(&self, user_id: i64, keyword: &str) -> Vec<NewsItem> {
        let needle = keyword.to_lowercase();
        let mut matches: Vec<NewsItem> = self
            .cache
            .snapshot()
            .await
            .into_iter()
            .filter(|item| {
                item.title.to_lowercase().contains(&needle)
                    || item.description.to_lowercase().contains(&needle)
            })
            .collect();

        if matches.len() < self.config.lists.min_local_matches {
            let since = (Utc::now() - chrono::Duration::days(self.config.lists.search_window_days))
                .date_naive();
            match self
                .provider
                .fetch_keyword(keyword, since, self.config.cache.aggregate_page_size)
                .await
            {
                Ok(raws) => {
                    let now = Utc::now();
                    for raw in raws {
                        if let Some(item) = normalize(raw, Category::Search, now) {
                            if !matches.iter().any(|m| m.identity() == item.identity()) {
                                matches.push(item);
                            }
                        }
                    }
                }
                Err(err) => {
                    warn!(error = %err, keyword, "keyword search failed, serving local matches");
                }
            }
        }

        matches.truncate(self.config.lists.filter_limit);
        self.views.record(user_id, matches.clone()).await;
        matches
    }

    /// Category-scoped headlines straight from the provider; on failure
    /// falls back to cached items of that category. Records the view.
    pub async fn category_news(&self, user_id: i64, category: Category) -> Vec<NewsItem> {
        let mut items = match self
            .provider
            .fetch_category(category, self.config.cache.aggregate_page_size)
            .await
        {
            Ok(raws) => {
                let now = Utc::now();
                dedupe(
                    raws.into_iter()
                        .filter_map(|raw| normalize(raw, category, now))
                        .collect(),
                )
            }
            Err(err) => {
                warn!(error = %err, %category, "category fetch failed, serving cached items");
                self.cache
                    .snapshot()
                    .await
                    .into_iter()
                    .filter(|item| item.category == category)
                    .collect()
            }
        };

        items.truncate(self.config.lists.category_limit);
        self.views.record(user_id, items.clone()).await;
        items
    }

    /// Resolves "save item N" against the user's last-shown list and
    /// stores the favorite.
    pub async fn save_item(&self, user_id: i64, index: usize) -> Result<SaveOutcome, IndexError> {
        let item = self.views.resolve(user_id, index).await?;
        Ok(self.favorites.save(user_id, item).await)
    }

    pub async fn favorites(&self, user_id: i64) -> Vec<NewsItem> {
        self.favorites.list(user_id).await
    }

    pub async fn toggle_daily(&self, user_id: i64) -> SubscriptionChange {
        self.subscriptions.toggle(user_id).await
    }

    pub async fn is_subscribed(&self, user_id: i64) -> bool {
        self.subscriptions.is_subscribed(user_id).await
    }

    /// The digest text for the current batch.
    pub async fn compose_digest(&self) -> String {
        let batch = self.cache.get_current(&self.provider).await;
        digest::compose_with_budget(
            &batch,
            self.config.digest.max_items,
            self.config.digest.description_budget,
        )
    }

    /// One digest message per subscriber. The text is composed once; an
    /// empty subscriber list short-circuits before any fetch.
    pub async fn digest_messages(&self) -> Vec<DigestMessage> {
        let subscribers = self.subscriptions.subscribers().await;
        if subscribers.is_empty() {
            info!("no digest subscribers");
            return Vec::new();
        }

        let text = self.compose_digest().await;
        subscribers
            .into_iter()
            .map(|user_id| DigestMessage {
                user_id,
                text: text.clone(),
            })
            .collect()
    }
}

/// Local wall-clock time at which the daily digest fires.
#[derive(Debug, Clone, Copy)]
pub struct DigestSchedule {
    pub hour: u32,
    pub minute: u32,
}

impl Default for DigestSchedule {
    fn default() -> Self {
        Self { hour: 9, minute: 0 }
    }
}

impl From<&DigestConfig> for DigestSchedule {
    fn from(config: &DigestConfig) -> Self {
        Self {
            hour: config.hour,
            minute: config.minute,
        }
    }
}

pub struct SchedulerHandle {
    cancel_tx: broadcast::Sender<()>,
    join: JoinHandle<()>,
}

impl SchedulerHandle {
    pub async fn stop(self) -> Result<(), tokio::task::JoinError> {
        let _ = self.cancel_tx.send(());
        self.join.await
    }
}

/// Spawns the digest broadcast driver: polls the local clock twice a
/// minute and, when it matches the schedule and has not fired today,
/// emits one message per subscriber on `tx`. A failed send is logged and
/// the remaining subscribers still get theirs.
pub fn spawn_digest_scheduler(
    service: Arc<NewsService>,
    schedule: DigestSchedule,
    tx: mpsc::Sender<DigestMessage>,
) -> SchedulerHandle {
    let (cancel_tx, mut cancel_rx) = broadcast::channel(1);
    let join = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(30));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut last_fired: Option<NaiveDate> = None;

        loop {
            tokio::select! {
                _ = cancel_rx.recv() => {
                    info!("digest scheduler shutdown requested");
                    break;
                }
                _ = ticker.tick() => {
                    let now = Local::now();
                    let due = now.hour() == schedule.hour
                        && now.minute() == schedule.minute
                        && last_fired != Some(now.date_naive());
                    if !due {
                        continue;
                    }
                    last_fired = Some(now.date_naive());

                    let messages = service.digest_messages().await;
                    info!(count = messages.len(), "broadcasting daily digest");
                    for message in messages {
                        let user_id = message.user_id;
                        if let Err(err) = tx.send(message).await {
                            warn!(user_id, %err, "failed to hand off digest message");
                        }
                    }
                }
            }
        }
    });

    SchedulerHandle { cancel_tx, join }
}
