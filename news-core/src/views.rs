use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::IndexError;
use crate::item::NewsItem;
use crate::storage::{read_json_or_default, write_json_atomic};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RecordedList {
    items: Vec<NewsItem>,
    created_at: DateTime<Utc>,
}

/// The exact ordered list each user last saw, so that "save item N"
/// resolves against what was actually rendered and nothing else.
///
/// Positions are 1-based and only valid until the user's next query
/// overwrites the entry or the retention window lapses.
#[derive(Clone)]
pub struct ListViews {
    inner: Arc<RwLock<HashMap<i64, RecordedList>>>,
    path: Option<PathBuf>,
    retention: Duration,
}

impl ListViews {
    pub fn in_memory(retention_hours: i64) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            path: None,
            retention: Duration::hours(retention_hours),
        }
    }

    pub async fn load_from(path: impl AsRef<Path>, retention_hours: i64) -> Self {
        let path = path.as_ref().to_path_buf();
        let data: HashMap<i64, RecordedList> = read_json_or_default(&path).await;
        Self {
            inner: Arc::new(RwLock::new(data)),
            path: Some(path),
            retention: Duration::hours(retention_hours),
        }
    }

    /// Overwrites the user's entry with the list just shown to them.
    pub async fn record(&self, user_id: i64, items: Vec<NewsItem>) {
        let mut inner = self.inner.write().await;
        inner.insert(
            user_id,
            RecordedList {
                items,
                created_at: Utc::now(),
            },
        );
        if let Some(path) = &self.path {
            write_json_atomic(path, &*inner).await;
        }
    }

    /// Resolves a 1-based position against the user's last-shown list.
    pub async fn resolve(&self, user_id: i64, index: usize) -> Result<NewsItem, IndexError> {
        let inner = self.inner.read().await;
        let entry = match inner.get(&user_id) {
            Some(entry) => entry,
            // Never shown a list: behaves as an empty one.
            None => return Err(IndexError::OutOfRange { index, len: 0 }),
        };

        if Utc::now() - entry.created_at > self.retention {
            debug!(user_id, "recorded list expired");
            return Err(IndexError::Expired);
        }

        if index < 1 || index > entry.items.len() {
            return Err(IndexError::OutOfRange {
                index,
                len: entry.items.len(),
            });
        }

        Ok(entry.items[index - 1].clone())
    }
}
