//! A connection dropped mid-body must leave the `.tmp` behind and never
//! publish the final cache entry

use std::time::Duration;

use model_fetch::{ModelCache, ModelSource, TransferCoordinator};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Serves one request with a Content-Length far beyond the bytes actually
/// written, then drops the connection.
async fn serve_truncated(listener: TcpListener) {
    let (mut socket, _) = listener.accept().await.expect("accept failed");
    let mut request = [0u8; 2048];
    let _ = socket.read(&mut request).await;

    let header = b"HTTP/1.1 200 OK\r\nContent-Length: 100000\r\nConnection: close\r\n\r\n";
    socket.write_all(header).await.expect("write header");
    socket.write_all(&[0xABu8; 1000]).await.expect("write partial body");
    socket.flush().await.expect("flush");
    // Dropping the socket truncates the body
}

#[tokio::test]
async fn midstream_disconnect_leaves_tmp_and_no_final_entry() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(serve_truncated(listener));

    let dir = tempfile::tempdir().unwrap();
    let cache = ModelCache::new(dir.path());
    let coordinator = TransferCoordinator::new(cache.clone()).unwrap();

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let url = format!("http://{}/models/model.glb", addr);
    coordinator.submit(ModelSource::RemoteUrl(url), tx).unwrap();

    let result = tokio::time::timeout(Duration::from_secs(10), rx.recv())
        .await
        .expect("fetch timed out")
        .expect("result sink dropped");

    assert!(result.outcome.is_err());
    assert!(!cache.has_complete_entry("model.glb"));
    assert!(cache.tmp_path("model.glb").exists());
    let partial = std::fs::metadata(cache.tmp_path("model.glb")).unwrap().len();
    assert!(partial <= 1000);
}
