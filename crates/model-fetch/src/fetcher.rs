//! Asset fetcher - streams remote models into the cache, reads local
//! sources to end-of-stream in bounded chunks

use futures_util::StreamExt;
use log::{debug, info};
use reqwest::Client;
use std::io::Read;
use std::path::Path;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::cache::ModelCache;
use crate::types::{
    derived_filename, DownloadProgress, FetchRequest, FetchedModel, ModelSource, ProgressSink,
    LOCAL_READ_BUFFER_SIZE,
};

/// Runs on the coordinator's worker, never on the submitting thread.
/// Blocking on network or file I/O is expected here.
pub(crate) async fn fetch(
    request: FetchRequest,
    cache: &ModelCache,
    progress: Option<&ProgressSink>,
) -> Result<FetchedModel, String> {
    match request.source {
        ModelSource::RemoteUrl(url) => fetch_remote(&url, cache, progress).await,
        ModelSource::LocalPath(path) => read_local_path(&path).await.map(FetchedModel::Bytes),
        ModelSource::LocalHandle(handle) => read_local_handle(handle).map(FetchedModel::Bytes),
    }
}

/// A single read never returns the whole stream; loop until end-of-stream.
async fn read_local_path(path: &Path) -> Result<Vec<u8>, String> {
    let mut file = tokio::fs::File::open(path)
        .await
        .map_err(|e| format!("Failed to open local file {}: {}", path.display(), e))?;
    let mut bytes = Vec::new();
    let mut buffer = [0u8; LOCAL_READ_BUFFER_SIZE];
    loop {
        let count = file
            .read(&mut buffer)
            .await
            .map_err(|e| format!("Failed to read local file {}: {}", path.display(), e))?;
        if count == 0 {
            break;
        }
        bytes.extend_from_slice(&buffer[..count]);
    }
    debug!("local_read_finish: {} bytes={}", path.display(), bytes.len());
    Ok(bytes)
}

/// Provider-issued handles expose a plain blocking stream
fn read_local_handle(mut handle: Box<dyn Read + Send>) -> Result<Vec<u8>, String> {
    let mut bytes = Vec::new();
    let mut buffer = [0u8; LOCAL_READ_BUFFER_SIZE];
    loop {
        let count = handle
            .read(&mut buffer)
            .map_err(|e| format!("Failed to read content handle: {}", e))?;
        if count == 0 {
            break;
        }
        bytes.extend_from_slice(&buffer[..count]);
    }
    debug!("handle_read_finish: bytes={}", bytes.len());
    Ok(bytes)
}

async fn fetch_remote(
    url: &str,
    cache: &ModelCache,
    progress: Option<&ProgressSink>,
) -> Result<FetchedModel, String> {
    let filename =
        derived_filename(url).ok_or_else(|| format!("URL has no filename segment: {}", url))?;

    if cache.has_complete_entry(&filename) {
        cache.remove_stale_tmp(&filename).await;
        let path = cache.entry_path(&filename);
        info!("cache_hit: {} path={}", filename, path.display());
        return Ok(FetchedModel::CachedFile(path));
    }

    cache.ensure_root().await?;

    let client = Client::builder()
        .build()
        .map_err(|e| format!("Failed to build HTTP client: {}", e))?;

    // Identity encoding keeps Content-Length meaningful for progress tracking.
    let response = client
        .get(url)
        .header("Accept-Encoding", "identity")
        .send()
        .await
        .map_err(|e| format!("Download request failed: {}", e))?;

    if !response.status().is_success() {
        return Err(format!("Download failed: {} {}", response.status(), url));
    }

    let total_bytes = response.content_length().unwrap_or(0);
    info!("download_start: {} total_bytes={}", filename, total_bytes);

    let tmp = cache.tmp_path(&filename);
    let mut file = tokio::fs::File::create(&tmp)
        .await
        .map_err(|e| format!("Failed to create temp file {}: {}", tmp.display(), e))?;

    // On any error below the .tmp file stays behind for inspection; the
    // final name appears only after the full byte count is written.
    let mut transferred: u64 = 0;
    let mut next_log_percent: u64 = 10;
    let mut stream = response.bytes_stream();
    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| format!("Failed to read chunk: {}", e))?;
        file.write_all(&chunk)
            .await
            .map_err(|e| format!("Failed to write temp file {}: {}", tmp.display(), e))?;
        transferred += chunk.len() as u64;

        let percent = if total_bytes > 0 {
            std::cmp::min(transferred * 100 / total_bytes, 100)
        } else {
            0
        };
        if total_bytes > 0 && percent >= next_log_percent {
            debug!(
                "download_progress: {} {}% ({}/{})",
                filename, percent, transferred, total_bytes
            );
            next_log_percent = percent - percent % 10 + 10;
        }
        if let Some(sink) = progress {
            let _ = sink.send(DownloadProgress {
                filename: filename.clone(),
                percent: percent as u32,
                transferred_bytes: transferred,
                total_bytes,
            });
        }
    }

    if total_bytes > 0 && transferred < total_bytes {
        return Err(format!(
            "Download truncated: {} got {} of {} bytes",
            filename, transferred, total_bytes
        ));
    }

    file.flush()
        .await
        .map_err(|e| format!("Failed to flush temp file {}: {}", tmp.display(), e))?;
    drop(file);

    let path = cache.finalize(&filename).await?;
    info!(
        "download_finish: {} bytes={} path={}",
        filename,
        transferred,
        path.display()
    );
    Ok(FetchedModel::CachedFile(path))
}
