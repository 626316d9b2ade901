use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use crate::item::NewsItem;
use crate::storage::{read_json_or_default, write_json_atomic};

/// Result of a save request. `AlreadyExists` is a normal idempotent
/// outcome, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    AlreadyExists,
}

/// Per-user saved items, deduplicated by identity key, kept in insertion
/// order. Append-only; there is no delete.
#[derive(Clone)]
pub struct FavoritesStore {
    inner: Arc<RwLock<HashMap<i64, Vec<NewsItem>>>>,
    path: Option<PathBuf>,
}

impl FavoritesStore {
    pub fn in_memory() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            path: None,
        }
    }

    pub async fn load_from(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let data: HashMap<i64, Vec<NewsItem>> = read_json_or_default(&path).await;
        Self {
            inner: Arc::new(RwLock::new(data)),
            path: Some(path),
        }
    }

    pub async fn save(&self, user_id: i64, item: NewsItem) -> SaveOutcome {
        let mut inner = self.inner.write().await;
        let saved = inner.entry(user_id).or_default();

        if saved.iter().any(|e| e.identity() == item.identity()) {
            debug!(user_id, title = %item.title, "item already in favorites");
            return SaveOutcome::AlreadyExists;
        }

        saved.push(item);
        if let Some(path) = &self.path {
            write_json_atomic(path, &*inner).await;
        }
        SaveOutcome::Saved
    }

    pub async fn list(&self, user_id: i64) -> Vec<NewsItem> {
        let inner = self.inner.read().await;
        inner.get(&user_id).cloned().unwrap_or_default()
    }

    pub async fn contains(&self, user_id: i64, identity: &str) -> bool {
        let inner = self.inner.read().await;
        inner
            .get(&user_id)
            .map(|saved| saved.iter().any(|e| e.identity() == identity))
            .unwrap_or(false)
    }
}
