pub mod cache;
pub mod config;
pub mod digest;
pub mod error;
pub mod favorites;
pub mod item;
pub mod provider;
pub mod service;
pub mod storage;
pub mod subscriptions;
pub mod views;

pub use cache::NewsCache;
pub use config::{AppConfig, CacheConfig, DigestConfig, ListConfig, ProviderConfig};
pub use digest::compose;
pub use error::{IndexError, ProviderError};
pub use favorites::{FavoritesStore, SaveOutcome};
pub use item::{dedupe, normalize, sample_items, Category, NewsItem};
pub use provider::{ProviderClient, RawArticle};
pub use service::{
    spawn_digest_scheduler, DigestMessage, DigestSchedule, NewsService, SchedulerHandle,
};
pub use subscriptions::{SubscriptionChange, SubscriptionRegistry};
pub use views::ListViews;
