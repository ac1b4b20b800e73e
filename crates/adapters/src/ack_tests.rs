// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use yare::parameterized;

fn response(status: AckStatus) -> AckResponse {
    AckResponse {
        status,
        reason: "See the details in CloudWatch Log Stream: 2026/10/18/abc".to_string(),
        physical_resource_id: "DeleteAmis".to_string(),
        stack_id: "stack/runners".to_string(),
        request_id: "req-1".to_string(),
        logical_resource_id: "DeleteAmis".to_string(),
        no_echo: false,
        data: serde_json::Map::new(),
    }
}

#[test]
fn body_uses_expected_field_names() {
    let body: serde_json::Value =
        serde_json::from_str(&response(AckStatus::Success).to_body().unwrap()).unwrap();
    assert_eq!(body["Status"], "SUCCESS");
    assert_eq!(body["PhysicalResourceId"], "DeleteAmis");
    assert_eq!(body["StackId"], "stack/runners");
    assert_eq!(body["RequestId"], "req-1");
    assert_eq!(body["LogicalResourceId"], "DeleteAmis");
    assert_eq!(body["NoEcho"], false);
    assert_eq!(body["Data"], serde_json::json!({}));
}

#[parameterized(
    with_query = { "https://bucket.example/cb?X-Sig=secret", "https://bucket.example/cb?<redacted>" },
    no_query = { "http://localhost/cb", "http://localhost/cb" },
)]
fn redacts_signature(url: &str, expected: &str) {
    assert_eq!(redact_url(url), expected);
}

#[parameterized(
    ftp = { "ftp://bucket.example/cb", "ftp" },
    file = { "file:///tmp/cb", "file" },
)]
fn non_http_schemes_are_unsupported(url: &str, scheme: &str) {
    assert_eq!(parse_url(url).unwrap_err(), AckError::UnsupportedScheme(scheme.to_string()));
}

#[test]
fn presigned_https_url_is_accepted() {
    let url = parse_url(
        "https://cloudformation-custom-resource-response-useast1.s3.amazonaws.com/abc?X-Amz-Signature=1",
    )
    .unwrap();
    assert_eq!(url.scheme(), "https");
    assert_eq!(url.query(), Some("X-Amz-Signature=1"));
}

#[tokio::test]
async fn malformed_url_is_invalid() {
    let err = HttpAckSink::default()
        .respond("not a url", &response(AckStatus::Success))
        .await
        .unwrap_err();
    assert!(matches!(err, AckError::InvalidUrl(_)));
}

async fn serve_once(reply: String) -> (String, tokio::task::JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = vec![0u8; 8192];
        let mut received = String::new();
        loop {
            let n = socket.read(&mut buf).await.unwrap();
            received.push_str(&String::from_utf8_lossy(&buf[..n]));
            if n == 0 || received.contains("\"Data\":{}}") {
                break;
            }
        }
        socket.write_all(reply.as_bytes()).await.unwrap();
        received
    });
    (addr, handle)
}

#[tokio::test]
async fn put_sends_json_with_empty_content_type() {
    let (addr, server) = serve_once("HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n".into()).await;
    HttpAckSink::default()
        .respond(&format!("http://{addr}/cb?sig=1"), &response(AckStatus::Failed))
        .await
        .unwrap();

    let request = server.await.unwrap();
    assert!(request.starts_with("PUT /cb?sig=1 HTTP/1.1\r\n"));
    let content_type = request
        .lines()
        .find_map(|l| l.to_ascii_lowercase().strip_prefix("content-type:").map(|v| v.trim().to_string()));
    assert_eq!(content_type.as_deref(), Some(""));
    assert!(request.contains("\"Status\":\"FAILED\""));
}

#[tokio::test]
async fn non_success_status_is_rejected() {
    let (addr, server) =
        serve_once("HTTP/1.1 403 Forbidden\r\nContent-Length: 13\r\n\r\nAccessDenied\n".into())
            .await;
    let err = HttpAckSink::default()
        .respond(&format!("http://{addr}/cb"), &response(AckStatus::Success))
        .await
        .unwrap_err();
    server.await.unwrap();
    assert_eq!(err, AckError::Rejected { status: 403, body: "AccessDenied".to_string() });
}

#[tokio::test]
async fn oversized_error_body_is_truncated() {
    let body = "x".repeat(3 * MAX_ERROR_BODY);
    let (addr, server) = serve_once(format!(
        "HTTP/1.1 500 Oops\r\nContent-Length: {}\r\n\r\n{body}",
        body.len()
    ))
    .await;
    let err = HttpAckSink::default()
        .respond(&format!("http://{addr}/cb"), &response(AckStatus::Success))
        .await
        .unwrap_err();
    server.await.unwrap();
    match err {
        AckError::Rejected { status, body } => {
            assert_eq!(status, 500);
            assert!(body.len() <= MAX_ERROR_BODY);
        }
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn absurd_content_length_is_an_error_not_a_crash() {
    let (addr, server) = serve_once(
        "HTTP/1.1 500 Oops\r\nContent-Length: 18446744073709551615\r\n\r\npartial".into(),
    )
    .await;
    let err = HttpAckSink::new(Duration::from_secs(5))
        .respond(&format!("http://{addr}/cb"), &response(AckStatus::Success))
        .await
        .unwrap_err();
    server.await.unwrap();
    assert!(
        matches!(err, AckError::Rejected { status: 500, .. } | AckError::Transport(_)),
        "unexpected error {err:?}"
    );
}

#[tokio::test]
async fn https_url_opens_a_tls_handshake() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut first = [0u8; 1];
        socket.read_exact(&mut first).await.unwrap();
        first[0]
    });

    let err = HttpAckSink::new(Duration::from_secs(5))
        .respond(&format!("https://127.0.0.1:{port}/cb?X-Amz-Signature=secret"), &response(AckStatus::Success))
        .await
        .unwrap_err();

    // 0x16: TLS handshake record
    assert_eq!(server.await.unwrap(), 0x16);
    assert!(matches!(err, AckError::Transport(_)));
    assert!(!err.to_string().contains("secret"));
}

#[tokio::test]
async fn fake_records_every_response() {
    let sink = FakeAckSink::new();
    sink.respond("http://cb", &response(AckStatus::Success)).await.unwrap();
    sink.fail();
    assert!(sink.respond("http://cb", &response(AckStatus::Failed)).await.is_err());
    let statuses: Vec<_> = sink.calls().iter().map(|c| c.response.status).collect();
    assert_eq!(statuses, vec![AckStatus::Success, AckStatus::Failed]);
}
