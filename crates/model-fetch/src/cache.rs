//! On-disk model cache with tmp-then-rename finishing

use log::debug;
use std::path::{Path, PathBuf};

/// Cache of downloaded model files keyed by derived filename.
///
/// A complete entry lives under its final name; an in-progress download
/// lives under a `.tmp` sibling and becomes visible only through an atomic
/// rename. A concurrent observer of the cache directory therefore sees a
/// final name as either absent or complete, never partially written.
#[derive(Debug, Clone)]
pub struct ModelCache {
    root: PathBuf,
}

impl ModelCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Final path of a complete entry
    pub fn entry_path(&self, filename: &str) -> PathBuf {
        self.root.join(filename)
    }

    /// Sibling path an in-progress download streams into
    pub fn tmp_path(&self, filename: &str) -> PathBuf {
        self.root.join(format!("{}.tmp", filename))
    }

    /// A finished entry is reused by path alone, with no freshness check
    pub fn has_complete_entry(&self, filename: &str) -> bool {
        self.entry_path(filename).is_file()
    }

    pub(crate) async fn ensure_root(&self) -> Result<(), String> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| format!("Failed to create cache directory {}: {}", self.root.display(), e))
    }

    /// Drop a `.tmp` left by an interrupted run next to a complete entry
    pub(crate) async fn remove_stale_tmp(&self, filename: &str) {
        let tmp = self.tmp_path(filename);
        if tokio::fs::try_exists(&tmp).await.unwrap_or(false) {
            debug!("cache_stale_tmp_removed: {}", tmp.display());
            let _ = tokio::fs::remove_file(&tmp).await;
        }
    }

    /// Atomically publish a finished download under its final name
    pub(crate) async fn finalize(&self, filename: &str) -> Result<PathBuf, String> {
        let tmp = self.tmp_path(filename);
        let path = self.entry_path(filename);
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| format!("Failed to finalize cache entry {}: {}", filename, e))?;
        Ok(path)
    }
}
