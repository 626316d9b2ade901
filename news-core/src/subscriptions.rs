use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::info;

use crate::storage::{read_json_or_default, write_json_atomic};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionChange {
    Subscribed,
    Unsubscribed,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct Subscription {
    subscribed: bool,
    subscribed_at: Option<DateTime<Utc>>,
    unsubscribed_at: Option<DateTime<Utc>>,
}

/// Users opted into the periodic digest. Toggling flips the current
/// state; repeated toggles alternate deterministically.
#[derive(Clone)]
pub struct SubscriptionRegistry {
    inner: Arc<RwLock<HashMap<i64, Subscription>>>,
    path: Option<PathBuf>,
}

impl SubscriptionRegistry {
    pub fn in_memory() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            path: None,
        }
    }

    pub async fn load_from(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let data: HashMap<i64, Subscription> = read_json_or_default(&path).await;
        Self {
            inner: Arc::new(RwLock::new(data)),
            path: Some(path),
        }
    }

    pub async fn toggle(&self, user_id: i64) -> SubscriptionChange {
        let mut inner = self.inner.write().await;
        let entry = inner.entry(user_id).or_default();
        let now = Utc::now();

        let change = if entry.subscribed {
            entry.subscribed = false;
            entry.unsubscribed_at = Some(now);
            SubscriptionChange::Unsubscribed
        } else {
            entry.subscribed = true;
            entry.subscribed_at = Some(now);
            SubscriptionChange::Subscribed
        };

        if let Some(path) = &self.path {
            write_json_atomic(path, &*inner).await;
        }

        info!(user_id, ?change, "subscription toggled");
        change
    }

    pub async fn is_subscribed(&self, user_id: i64) -> bool {
        let inner = self.inner.read().await;
        inner.get(&user_id).map(|s| s.subscribed).unwrap_or(false)
    }

    /// Currently-subscribed users, sorted for a deterministic broadcast
    /// order.
    pub async fn subscribers(&self) -> Vec<i64> {
        let inner = self.inner.read().await;
        let mut ids: Vec<i64> = inner
            .iter()
            .filter(|(_, s)| s.subscribed)
            .map(|(id, _)| *id)
            .collect();
        ids.sort_unstable();
        ids
    }
}
