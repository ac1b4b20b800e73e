// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Acknowledgement callback for provisioning-lifecycle events.
//!
//! The orchestration system waits on a pre-signed URL for a JSON document
//! saying whether the handler succeeded. Exactly one response is sent per
//! event, and the URL is a credential: it never appears in logs unredacted.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Url};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AckError {
    #[error("invalid response url {0}")]
    InvalidUrl(String),
    #[error("unsupported response url scheme: {0}")]
    UnsupportedScheme(String),
    #[error("ack transport failed: {0}")]
    Transport(String),
    #[error("ack rejected with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("ack encoding failed: {0}")]
    Encode(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AckStatus {
    #[serde(rename = "SUCCESS")]
    Success,
    #[serde(rename = "FAILED")]
    Failed,
}

fleet_core::simple_display! {
    AckStatus {
        Success => "SUCCESS",
        Failed => "FAILED",
    }
}

/// Response document, field names as the orchestration system expects them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AckResponse {
    pub status: AckStatus,
    pub reason: String,
    pub physical_resource_id: String,
    pub stack_id: String,
    pub request_id: String,
    pub logical_resource_id: String,
    pub no_echo: bool,
    pub data: serde_json::Map<String, serde_json::Value>,
}

impl AckResponse {
    pub fn to_body(&self) -> Result<String, AckError> {
        serde_json::to_string(self).map_err(|e| AckError::Encode(e.to_string()))
    }
}

/// Strip the query string (the signature) from a response URL for logging.
pub fn redact_url(url: &str) -> String {
    match url.split_once('?') {
        Some((base, _)) => format!("{base}?<redacted>"),
        None => url.to_string(),
    }
}

#[async_trait]
pub trait AckSink: Clone + Send + Sync + 'static {
    async fn respond(&self, response_url: &str, response: &AckResponse) -> Result<(), AckError>;
}

/// Rejection bodies are read up to this many bytes.
const MAX_ERROR_BODY: usize = 4096;

/// Sends the acknowledgement as an HTTP PUT to the pre-signed URL.
#[derive(Debug, Clone)]
pub struct HttpAckSink {
    timeout: Duration,
}

impl Default for HttpAckSink {
    fn default() -> Self {
        Self { timeout: Duration::from_secs(30) }
    }
}

impl HttpAckSink {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

fn parse_url(url: &str) -> Result<Url, AckError> {
    let parsed = Url::parse(url).map_err(|_| AckError::InvalidUrl(redact_url(url)))?;
    match parsed.scheme() {
        "https" | "http" => {}
        other => return Err(AckError::UnsupportedScheme(other.to_string())),
    }
    Ok(parsed)
}

// reqwest errors embed the full URL, signature included.
fn transport(e: reqwest::Error) -> AckError {
    if e.is_timeout() {
        AckError::Transport("ack request timed out".into())
    } else {
        AckError::Transport(e.without_url().to_string())
    }
}

#[async_trait]
impl AckSink for HttpAckSink {
    async fn respond(&self, response_url: &str, response: &AckResponse) -> Result<(), AckError> {
        let url = parse_url(response_url)?;
        let body = response.to_body()?;
        let client = Client::builder().timeout(self.timeout).build().map_err(transport)?;

        // Pre-signed URLs are signed with an empty content type.
        let result = client
            .put(url)
            .header(CONTENT_TYPE, "")
            .body(body)
            .send()
            .await
            .map_err(transport);
        let reply = match result {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(url = %redact_url(response_url), error = %e, "ack not delivered");
                return Err(e);
            }
        };

        let status = reply.status().as_u16();
        if reply.status().is_success() {
            tracing::debug!(url = %redact_url(response_url), status, "ack delivered");
            return Ok(());
        }
        let body = read_capped(reply).await;
        tracing::warn!(url = %redact_url(response_url), status, body = %body, "ack rejected");
        Err(AckError::Rejected { status, body })
    }
}

/// Read at most [`MAX_ERROR_BODY`] bytes, ignoring the declared length.
async fn read_capped(mut reply: reqwest::Response) -> String {
    let mut buf = Vec::new();
    while buf.len() < MAX_ERROR_BODY {
        match reply.chunk().await {
            Ok(Some(chunk)) => {
                let take = chunk.len().min(MAX_ERROR_BODY - buf.len());
                buf.extend_from_slice(&chunk[..take]);
            }
            Ok(None) | Err(_) => break,
        }
    }
    String::from_utf8_lossy(&buf).trim().to_string()
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::{AckError, AckResponse, AckSink};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Recorded acknowledgement
    #[derive(Debug, Clone, PartialEq)]
    pub struct AckCall {
        pub response_url: String,
        pub response: AckResponse,
    }

    #[derive(Default)]
    struct FakeAckState {
        calls: Vec<AckCall>,
        fail: bool,
    }

    #[derive(Clone, Default)]
    pub struct FakeAckSink {
        inner: Arc<Mutex<FakeAckState>>,
    }

    impl FakeAckSink {
        pub fn new() -> Self {
            Self::default()
        }

        /// Make every later `respond` fail with a transport error.
        pub fn fail(&self) {
            self.inner.lock().fail = true;
        }

        pub fn calls(&self) -> Vec<AckCall> {
            self.inner.lock().calls.clone()
        }
    }

    #[async_trait]
    impl AckSink for FakeAckSink {
        async fn respond(&self, response_url: &str, response: &AckResponse) -> Result<(), AckError> {
            let mut state = self.inner.lock();
            state.calls.push(AckCall {
                response_url: response_url.to_string(),
                response: response.clone(),
            });
            if state.fail {
                return Err(AckError::Transport("connection refused".into()));
            }
            Ok(())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{AckCall, FakeAckSink};

#[cfg(test)]
#[path = "ack_tests.rs"]
mod tests;
