//! Fetcher behavior against an in-process HTTP stub that mimics the
//! redirect-then-binary contract of the log-download endpoint.

use aemtail::api::{LogClient, LogClientConfig};
use aemtail::error::TailError;
use aemtail::pipeline::{rendezvous, run_downloader, LOG_FILE_NAME};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::Write;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;

#[derive(Clone, Copy)]
enum ApiMode {
    /// 200 with a redirect pointing back at the stub's /blob route.
    Redirect,
    /// 200 with a JSON body that has no redirect field.
    NoRedirect,
    /// Non-200 on the download endpoint.
    Failure(u16),
}

#[derive(Clone)]
struct Stub {
    api_mode: ApiMode,
    payload: Arc<Mutex<Vec<u8>>>,
}

async fn handle_connection(mut socket: TcpStream, stub: Stub, addr: SocketAddr) {
    let mut request = Vec::new();
    let mut buf = [0u8; 1024];
    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(n) => request.extend_from_slice(&buf[..n]),
        }
    }
    let request = String::from_utf8_lossy(&request);
    let path = request.split_whitespace().nth(1).unwrap_or("/").to_string();

    let (status, body): (u16, Vec<u8>) = if path.starts_with("/api/") {
        match stub.api_mode {
            ApiMode::Redirect => (
                200,
                format!("{{\"redirect\":\"http://{addr}/blob\"}}").into_bytes(),
            ),
            ApiMode::NoRedirect => (200, b"{}".to_vec()),
            ApiMode::Failure(code) => (code, b"boom".to_vec()),
        }
    } else if path.starts_with("/blob") {
        (200, stub.payload.lock().unwrap().clone())
    } else {
        (404, Vec::new())
    };

    let reason = if status == 200 { "OK" } else { "Error" };
    let head = format!(
        "HTTP/1.1 {status} {reason}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    );
    let _ = socket.write_all(head.as_bytes()).await;
    let _ = socket.write_all(&body).await;
}

async fn spawn_stub(stub: Stub) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            tokio::spawn(handle_connection(socket, stub.clone(), addr));
        }
    });
    addr
}

fn client_for(addr: SocketAddr, work_dir: &Path) -> LogClient {
    LogClient::new(LogClientConfig {
        base_url: format!("http://{addr}"),
        org_id: "org@AdobeOrg".into(),
        client_id: "client".into(),
        access_token: "token".into(),
        service: "author".into(),
        log_name: "aemerror".into(),
        environment_id: "e1".into(),
        program_id: "p1".into(),
        work_dir: work_dir.to_path_buf(),
    })
}

#[tokio::test]
async fn test_download_writes_archive_then_dedups_by_length() {
    let dir = tempfile::tempdir().unwrap();
    let payload = Arc::new(Mutex::new(b"first payload bytes".to_vec()));
    let addr = spawn_stub(Stub {
        api_mode: ApiMode::Redirect,
        payload: payload.clone(),
    })
    .await;

    let mut client = client_for(addr, dir.path());
    let archive = client.download_log().await.unwrap();
    assert_eq!(std::fs::read(&archive).unwrap(), b"first payload bytes");

    // Same content length, different bytes: treated as a duplicate poll,
    // the archive on disk is left untouched.
    *payload.lock().unwrap() = b"other payload bytes".to_vec();
    client.download_log().await.unwrap();
    assert_eq!(std::fs::read(&archive).unwrap(), b"first payload bytes");

    // A genuinely grown payload is written in place.
    *payload.lock().unwrap() = b"first payload bytes plus more".to_vec();
    client.download_log().await.unwrap();
    assert_eq!(
        std::fs::read(&archive).unwrap(),
        b"first payload bytes plus more"
    );
}

#[tokio::test]
async fn test_non_200_download_response_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let addr = spawn_stub(Stub {
        api_mode: ApiMode::Failure(500),
        payload: Arc::new(Mutex::new(Vec::new())),
    })
    .await;

    let mut client = client_for(addr, dir.path());
    let err = client.download_log().await.unwrap_err();
    assert!(matches!(err, TailError::Status { status: 500, .. }));
}

fn gzip_bytes(content: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(content).unwrap();
    encoder.finish().unwrap()
}

/// Poll until `predicate` holds, or give up after a couple of seconds.
async fn wait_until(mut predicate: impl FnMut() -> bool) {
    for _ in 0..200 {
        if predicate() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached in time");
}

#[tokio::test]
async fn test_shutdown_unblocks_a_downloader_waiting_on_handoff() {
    let dir = tempfile::tempdir().unwrap();
    let addr = spawn_stub(Stub {
        api_mode: ApiMode::Redirect,
        payload: Arc::new(Mutex::new(gzip_bytes(b"line1\n"))),
    })
    .await;

    // Keep the consumer half alive but never drain, so after the first
    // append the loop parks on the handoff.
    let (producer, _consumer) = rendezvous();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let log_path = dir.path().join(LOG_FILE_NAME);
    let handle = tokio::spawn(run_downloader(
        client_for(addr, dir.path()),
        log_path.clone(),
        Duration::from_secs(3600),
        producer,
        shutdown_rx,
    ));

    wait_until(|| log_path.exists() && std::fs::metadata(&log_path).unwrap().len() == 6).await;
    shutdown_tx.send(true).unwrap();
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_shutdown_unblocks_a_sleeping_downloader() {
    let dir = tempfile::tempdir().unwrap();
    let addr = spawn_stub(Stub {
        api_mode: ApiMode::Redirect,
        payload: Arc::new(Mutex::new(gzip_bytes(b"line1\n"))),
    })
    .await;

    // Drain every handoff so the loop reaches the inter-poll sleep, sized
    // here so the test would hang without the shutdown signal.
    let (producer, mut consumer) = rendezvous();
    tokio::spawn(async move {
        while consumer.wait().await {
            consumer.complete();
        }
    });

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let log_path = dir.path().join(LOG_FILE_NAME);
    let handle = tokio::spawn(run_downloader(
        client_for(addr, dir.path()),
        log_path.clone(),
        Duration::from_secs(3600),
        producer,
        shutdown_rx,
    ));

    wait_until(|| log_path.exists() && std::fs::metadata(&log_path).unwrap().len() == 6).await;
    shutdown_tx.send(true).unwrap();
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_missing_redirect_field_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let addr = spawn_stub(Stub {
        api_mode: ApiMode::NoRedirect,
        payload: Arc::new(Mutex::new(Vec::new())),
    })
    .await;

    let mut client = client_for(addr, dir.path());
    let err = client.download_log().await.unwrap_err();
    assert!(matches!(err, TailError::MissingRedirect));
}
