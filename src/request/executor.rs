use std::time::Instant;

use async_trait::async_trait;
use reqwest::header::{HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde_json::Value;

use crate::debug::debug_log;
use crate::error::RequestFailure;
use crate::request::request_item::RequestConfig;
use crate::request::result::{Elapsed, RequestResult};

/// A response that made it back over the wire, body already read.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    pub status_text: String,
    pub body: String,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends one request. `slot` is the 1-based position in the batch.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, slot: usize, config: &RequestConfig) -> Result<TransportResponse, RequestFailure>;
}

/// HTTP transport over a shared `reqwest::Client`.
///
/// The client has no request timeout: a request runs until the server
/// answers or the connection fails.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .user_agent(concat!("rusty-fanout/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    pub(crate) fn build_request(&self, config: &RequestConfig) -> reqwest::RequestBuilder {
        let mut builder = self
            .client
            .request(config.method.to_reqwest(), &config.endpoint)
            .header(ACCEPT, HeaderValue::from_static("application/json"));

        if let Some(token) = config.bearer_token() {
            builder = builder.header(AUTHORIZATION, format!("Bearer {}", token));
        }

        if let Some(body) = config.wire_body() {
            let payload = match body {
                Value::String(raw) => raw.clone(),
                other => other.to_string(),
            };
            builder = builder
                .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
                .body(payload);
        }

        builder
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, slot: usize, config: &RequestConfig) -> Result<TransportResponse, RequestFailure> {
        let res = self
            .build_request(config)
            .send()
            .await
            .map_err(|source| RequestFailure::Transport { source })?;

        let status = res.status();
        let status_text = reason_phrase(&res);
        let headers = res.headers().clone();

        let text = if status.is_success() {
            res.text().await.map_err(|source| RequestFailure::ReadBody {
                status: status.as_u16(),
                status_text: status_text.clone(),
                source,
            })?
        } else {
            // the body of a failed status is never reported
            match res.text().await {
                Ok(text) => text,
                Err(err) => {
                    tracing::debug!(request_id = slot, error = %err, "discarding unreadable error body");
                    String::new()
                }
            }
        };

        debug_log(config.method.as_str(), slot, &config.endpoint, status.as_u16(), &headers, &text);

        Ok(TransportResponse { status: status.as_u16(), status_text, body: text })
    }
}

/// The reason phrase the server sent, or the canonical one for the status.
fn reason_phrase(res: &reqwest::Response) -> String {
    res.extensions()
        .get::<hyper::ext::ReasonPhrase>()
        .and_then(|reason| std::str::from_utf8(reason.as_bytes()).ok())
        .or_else(|| res.status().canonical_reason())
        .unwrap_or("")
        .to_owned()
}

/// JSON when it parses, the raw text otherwise.
pub fn parse_body(text: String) -> Value {
    match serde_json::from_str(&text) {
        Ok(value) => value,
        Err(_) => Value::String(text),
    }
}

/// Run one slot to completion. Every failure is folded into the returned
/// record; this never returns an error.
pub async fn execute_single_request(
    request_id: usize,
    config: &RequestConfig,
    transport: &dyn Transport,
) -> RequestResult {
    let start = Instant::now();
    tracing::debug!(request_id, method = %config.method, endpoint = %config.endpoint, "starting request");

    match transport.send(request_id, config).await {
        Ok(res) if res.is_success() => {
            let elapsed = start.elapsed();
            tracing::info!(request_id, status = res.status, elapsed_ms = elapsed.as_millis() as u64, "request completed");
            RequestResult::succeeded(request_id, config, res.status, res.status_text, parse_body(res.body), elapsed)
        }
        Ok(res) => {
            let failure = RequestFailure::HttpStatus { status: res.status, status_text: res.status_text };
            let elapsed = start.elapsed();
            tracing::warn!(request_id, error = %failure, elapsed_ms = elapsed.as_millis() as u64, "request failed");
            RequestResult::failed(request_id, config, &failure, Elapsed::Measured(elapsed))
        }
        Err(failure) => {
            let elapsed = start.elapsed();
            tracing::warn!(request_id, error = %failure, elapsed_ms = elapsed.as_millis() as u64, "request failed");
            RequestResult::failed(request_id, config, &failure, Elapsed::Measured(elapsed))
        }
    }
}
