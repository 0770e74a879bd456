//! Tests against a real listener with a real HTTP client.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use api_gateway::config::GatewayConfig;
use api_gateway::handlers;
use api_gateway::http::HttpServer;
use api_gateway::lifecycle::Shutdown;
use api_gateway::routing::Registry;
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

mod common;

struct Running {
    addr: SocketAddr,
    shutdown: Shutdown,
    handle: tokio::task::JoinHandle<Result<(), std::io::Error>>,
}

async fn start(config: GatewayConfig, registry: Arc<Registry>) -> Running {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let server = HttpServer::new(config, registry);
    let handle = tokio::spawn(async move { server.run(listener, server_shutdown).await });

    Running { addr, shutdown, handle }
}

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_source_ips_include_peer_address() {
    let server = start(GatewayConfig::default(), common::test_registry()).await;

    let res = client()
        .get(format!("http://{}/api/test/echo", server.addr))
        .header("x-forwarded-for", "198.51.100.4")
        .send()
        .await
        .expect("gateway unreachable");
    assert_eq!(res.status(), 200);
    assert!(res.headers().contains_key("x-request-id"));

    let body = common::parse_body(&res.text().await.unwrap());
    assert_eq!(body["token"]["source_ips"], json!(["127.0.0.1", "198.51.100.4"]));

    server.shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), server.handle)
        .await
        .expect("server did not stop")
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_post_reason_header_and_identity() {
    let mut config = GatewayConfig::default();
    config.api.identity_header = Some("x-remote-user".into());
    let server = start(config, common::test_registry()).await;

    let res = client()
        .post(format!("http://{}/api/test/echo", server.addr))
        .header("x-api-reason", "ticket%20%2317")
        .header("x-remote-user", "alice")
        .json(&json!({"bar": "x"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    let body = common::parse_body(&res.text().await.unwrap());
    assert_eq!(body["args"], json!({"bar": "x"}));
    assert_eq!(body["token"]["reason"], "ticket #17");
    assert_eq!(body["token"]["username"], "alice");

    server.shutdown.trigger();
}

#[tokio::test]
async fn test_multipart_upload_builtin() {
    let config = GatewayConfig::default();
    let registry = handlers::bootstrap(&config).unwrap();
    let server = start(config, registry).await;

    let form = reqwest::multipart::Form::new()
        .text("_params_", r#"{"description": "nightly", "overwrite": true}"#)
        .part(
            "file",
            reqwest::multipart::Part::bytes(vec![0u8, 1, 2, 3, 4]).file_name("blob.bin"),
        );
    let res = client()
        .post(format!("http://{}/api/uploads/backups/blob.bin?strip_type_info=1", server.addr))
        .header("x-strip-type-info", "1")
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    let body = common::parse_body(&res.text().await.unwrap());
    assert_eq!(
        body,
        json!({"path": "backups/blob.bin", "size": 5, "description": "nightly", "overwrite": true})
    );

    server.shutdown.trigger();
}

#[tokio::test]
async fn test_oversized_body_rejected() {
    let mut config = GatewayConfig::default();
    config.listener.max_body_size = 16;
    let server = start(config, common::test_registry()).await;

    let res = client()
        .post(format!("http://{}/api/test/echo", server.addr))
        .header("content-type", "application/json")
        .body(format!(r#"{{"bar": "{}"}}"#, "x".repeat(64)))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 500);
    assert_eq!(res.headers()["x-content-type-options"], "nosniff");
    assert_eq!(
        common::parse_body(&res.text().await.unwrap()),
        json!({"message": "request body exceeds the limit of 16 bytes"})
    );

    server.shutdown.trigger();
}

/// Write `request` on a fresh connection and collect whatever comes back.
async fn raw_exchange(addr: SocketAddr, request: &[u8]) -> String {
    let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
    stream.write_all(request).await.unwrap();

    let mut response = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        match tokio::time::timeout(Duration::from_secs(5), stream.read(&mut chunk)).await {
            Ok(Ok(0)) | Ok(Err(_)) | Err(_) => break,
            Ok(Ok(n)) => {
                response.extend_from_slice(&chunk[..n]);
                if String::from_utf8_lossy(&response).contains("\"}") {
                    break;
                }
            }
        }
    }
    String::from_utf8_lossy(&response).into_owned()
}

fn split_response(raw: &str) -> (&str, &str) {
    raw.split_once("\r\n\r\n").expect("no header terminator")
}

#[tokio::test]
async fn test_oversized_chunked_body_rejected() {
    let mut config = GatewayConfig::default();
    config.listener.max_body_size = 16;
    let server = start(config, common::test_registry()).await;

    let payload = format!(r#"{{"bar": "{}"}}"#, "x".repeat(64));
    let request = format!(
        "POST /api/test/echo HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\n\
         Transfer-Encoding: chunked\r\nConnection: close\r\n\r\n{:x}\r\n{}\r\n0\r\n\r\n",
        payload.len(),
        payload
    );
    let raw = raw_exchange(server.addr, request.as_bytes()).await;
    let (head, body) = split_response(&raw);

    assert!(head.starts_with("HTTP/1.1 500"), "{}", head);
    assert!(head.to_ascii_lowercase().contains("x-content-type-options: nosniff"));
    assert_eq!(
        common::parse_body(body),
        json!({"message": "request body exceeds the limit of 16 bytes"})
    );

    server.shutdown.trigger();
}

#[tokio::test]
async fn test_stalled_body_times_out() {
    let mut config = GatewayConfig::default();
    config.timeouts.body_read_secs = 1;
    let server = start(config, common::test_registry()).await;

    // Promise 100 bytes, send 10, then stall.
    let request = "POST /api/test/echo HTTP/1.1\r\nHost: localhost\r\n\
        Content-Type: application/json\r\nContent-Length: 100\r\n\r\n{\"bar\": 1";
    let raw = raw_exchange(server.addr, request.as_bytes()).await;
    let (head, body) = split_response(&raw);

    assert!(head.starts_with("HTTP/1.1 500"), "{}", head);
    assert_eq!(
        common::parse_body(body),
        json!({"message": "failed to read request body: timed out after 1s"})
    );

    server.shutdown.trigger();
}
