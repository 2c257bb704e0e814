//! # HTTP Transport Integration Tests / HTTP 传输集成测试
//!
//! Exercises the `reqwest` transport against a minimal loopback server.
//! 针对最小化的本地回环服务器测试 `reqwest` 传输。

use api_runner::core::models::{Headers, HttpMethod};
use api_runner::infra::http::{HttpRequest, ReqwestTransport, Transport, TransportError};
use serde_json::json;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

/// Reads one request (head and body) from the stream.
async fn read_request(stream: &mut TcpStream) -> String {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = stream.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buffer.extend_from_slice(&chunk[..n]);
        let text = String::from_utf8_lossy(&buffer).to_string();
        if let Some(head_end) = text.find("\r\n\r\n") {
            let content_length = text[..head_end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if buffer.len() >= head_end + 4 + content_length {
                return text;
            }
        }
    }
    String::from_utf8_lossy(&buffer).to_string()
}

/// Serves one connection with a canned response and hands back the raw request.
async fn serve_once(response: &'static str) -> (String, oneshot::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let request = read_request(&mut stream).await;
        stream.write_all(response.as_bytes()).await.unwrap();
        stream.shutdown().await.ok();
        let _ = tx.send(request);
    });
    (url, rx)
}

fn request(method: HttpMethod, url: String) -> HttpRequest {
    HttpRequest {
        method,
        url,
        headers: Headers::new(),
        body: None,
        timeout: Duration::from_secs(5),
    }
}

#[tokio::test]
async fn test_status_headers_and_body_are_returned() {
    let (base, received) = serve_once(
        "HTTP/1.1 201 Created\r\nContent-Type: application/json\r\nX-Request-Id: abc\r\nContent-Length: 9\r\nConnection: close\r\n\r\n{\"id\":7}\n",
    )
    .await;
    let transport = ReqwestTransport::new(Duration::from_secs(2)).unwrap();

    let mut req = request(HttpMethod::Post, format!("{base}/pets"));
    req.headers.insert("X-Trace".into(), "t-1".into());
    req.body = Some(json!({"name": "Rex"}));
    let response = transport.send(req).await.unwrap();

    assert_eq!(response.status, 201);
    assert_eq!(response.body, "{\"id\":7}\n");
    assert_eq!(response.headers["x-request-id"], "abc");
    assert_eq!(response.headers["content-type"], "application/json");

    let raw = received.await.unwrap();
    assert!(raw.starts_with("POST /pets HTTP/1.1"), "raw request: {raw}");
    assert!(raw.to_ascii_lowercase().contains("x-trace: t-1"));
    assert!(raw.ends_with(r#"{"name":"Rex"}"#));
}

#[tokio::test]
async fn test_error_statuses_are_responses_not_failures() {
    let (base, _received) = serve_once(
        "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
    )
    .await;
    let transport = ReqwestTransport::new(Duration::from_secs(2)).unwrap();

    let response = transport
        .send(request(HttpMethod::Get, format!("{base}/missing")))
        .await
        .unwrap();
    assert_eq!(response.status, 404);
    assert!(response.body.is_empty());
}

#[tokio::test]
async fn test_slow_server_times_out() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let _ = read_request(&mut stream).await;
        tokio::time::sleep(Duration::from_secs(5)).await;
    });
    let transport = ReqwestTransport::new(Duration::from_secs(2)).unwrap();

    let mut req = request(HttpMethod::Get, format!("{base}/slow"));
    req.timeout = Duration::from_millis(100);
    let err = transport.send(req).await.unwrap_err();
    assert_eq!(err, TransportError::Timeout(100));
    assert_eq!(err.to_string(), "Request timed out after 100 ms");
}

#[tokio::test]
async fn test_refused_connection_is_a_connect_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);
    let transport = ReqwestTransport::new(Duration::from_secs(2)).unwrap();

    let err = transport
        .send(request(HttpMethod::Get, format!("{base}/")))
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::Connect(_)), "unexpected error: {err:?}");
}

#[tokio::test]
async fn test_invalid_header_is_rejected_before_sending() {
    let transport = ReqwestTransport::new(Duration::from_secs(2)).unwrap();
    let mut req = request(HttpMethod::Get, "http://127.0.0.1:9/".to_string());
    req.headers.insert("Bad Header".into(), "x".into());

    let err = transport.send(req).await.unwrap_err();
    assert!(matches!(err, TransportError::InvalidRequest(_)));
}
