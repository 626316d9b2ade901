use std::path::Path;

use serde::{de::DeserializeOwned, Serialize};
use tracing::warn;

/// Reads a JSON store file, trying the `.json.tmp` sibling when the main
/// file is corrupt, and falling back to `Default` when nothing is
/// readable. Store I/O never fails callers; they degrade to empty state.
pub async fn read_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    match tokio::fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice::<T>(&bytes) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, path = %path.display(), "failed to parse JSON, trying tmp fallback");
                let tmp = path.with_extension("json.tmp");
                match tokio::fs::read(&tmp).await {
                    Ok(tmp_bytes) => serde_json::from_slice::<T>(&tmp_bytes).unwrap_or_default(),
                    Err(_) => Default::default(),
                }
            }
        },
        Err(_) => Default::default(),
    }
}

/// Persists a JSON store atomically: write a temp sibling, then rename
/// over the live file. Failures are logged and swallowed.
pub async fn write_json_atomic<T: Serialize>(path: &Path, value: &T) {
    let bytes = match serde_json::to_vec_pretty(value) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(error = %e, path = %path.display(), "failed to serialize store");
            return;
        }
    };

    if let Some(parent) = path.parent() {
        let _ = tokio::fs::create_dir_all(parent).await;
    }

    let tmp = path.with_extension("json.tmp");
    if let Err(e) = tokio::fs::write(&tmp, &bytes).await {
        warn!(error = %e, path = %tmp.display(), "failed to write temp store file");
        return;
    }
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        warn!(error = %e, path = %path.display(), "failed to persist store file");
    }
}
