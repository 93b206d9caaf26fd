//! Fetch request/result types and progress event payloads

use serde::Serialize;
use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};

use tokio::sync::mpsc;

/// Read buffer size for local paths and content handles (8 KiB)
pub const LOCAL_READ_BUFFER_SIZE: usize = 8 * 1024;

/// Capacity of the worker command queue
pub(crate) const COMMAND_QUEUE_SIZE: usize = 8;

/// Channel end the worker delivers completion messages into
pub type ResultSink = mpsc::UnboundedSender<TransferResult>;

/// Channel end receiving download progress events
pub type ProgressSink = mpsc::UnboundedSender<DownloadProgress>;

/// Where a model's bytes come from
pub enum ModelSource {
    /// HTTP(S) URL; the last path segment names the cache entry
    RemoteUrl(String),
    /// Plain filesystem path, read fully without touching the cache
    LocalPath(PathBuf),
    /// Opaque provider-issued handle, read to end-of-stream in bounded chunks
    LocalHandle(Box<dyn Read + Send>),
}

impl fmt::Debug for ModelSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelSource::RemoteUrl(url) => write!(f, "RemoteUrl({})", url),
            ModelSource::LocalPath(path) => write!(f, "LocalPath({})", path.display()),
            ModelSource::LocalHandle(_) => write!(f, "LocalHandle"),
        }
    }
}

/// One user-initiated load; immutable, consumed once by the worker
#[derive(Debug)]
pub struct FetchRequest {
    pub(crate) id: u64,
    pub(crate) source: ModelSource,
}

impl FetchRequest {
    /// Validates that a remote source carries a usable filename segment
    pub(crate) fn new(id: u64, source: ModelSource) -> Result<Self, String> {
        if let ModelSource::RemoteUrl(url) = &source {
            derived_filename(url).ok_or_else(|| format!("URL has no filename segment: {}", url))?;
        }
        Ok(Self { id, source })
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

/// Last path segment of a URL; cache entries are keyed by it
pub fn derived_filename(url: &str) -> Option<String> {
    if url.is_empty() {
        return None;
    }
    let name = match url.rfind('/') {
        Some(slash) => &url[slash + 1..],
        None => url,
    };
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// A materialized model: a complete cache entry (remote fetch) or bytes
/// already in memory (local source)
pub enum FetchedModel {
    CachedFile(PathBuf),
    Bytes(Vec<u8>),
}

impl FetchedModel {
    /// Cache path of a remote fetch; `None` for in-memory payloads
    pub fn resolved_path(&self) -> Option<&Path> {
        match self {
            FetchedModel::CachedFile(path) => Some(path),
            FetchedModel::Bytes(_) => None,
        }
    }

    /// Read the payload fully into memory for the renderer
    pub fn into_model_bytes(self) -> Result<Vec<u8>, String> {
        match self {
            FetchedModel::CachedFile(path) => std::fs::read(&path)
                .map_err(|e| format!("Failed to read cached model {}: {}", path.display(), e)),
            FetchedModel::Bytes(bytes) => Ok(bytes),
        }
    }
}

impl fmt::Debug for FetchedModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchedModel::CachedFile(path) => write!(f, "CachedFile({})", path.display()),
            FetchedModel::Bytes(bytes) => write!(f, "Bytes(len={})", bytes.len()),
        }
    }
}

/// Outcome of one fetch, produced exactly once per accepted request and
/// delivered across the thread boundary as a single message
#[derive(Debug)]
pub struct TransferResult {
    pub request_id: u64,
    pub outcome: Result<FetchedModel, String>,
}

/// Progress event payload for remote downloads
#[derive(Debug, Clone, Serialize)]
pub struct DownloadProgress {
    pub filename: String,
    pub percent: u32,
    pub transferred_bytes: u64,
    /// Server-reported content length; 0 when unknown
    pub total_bytes: u64,
}
