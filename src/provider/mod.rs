//! LLM provider adapters
//!
//! Each upstream provider speaks its own JSON shape over server-sent events;
//! the adapters here translate every one of them into the same internal
//! stream of text deltas so the rest of the service never sees a provider
//! wire format.

pub mod gemini;
pub mod openai;
pub mod sse;

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use tokio::sync::mpsc;

use sse::{SseParser, DONE_SENTINEL};

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upstream rejected the request ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("failed to parse upstream response: {0}")]
    InvalidResponse(String),

    #[error("stream stalled past the inactivity timeout")]
    StreamTimeout,
}

/// Incremental text from a streaming generation call, in upstream order. The
/// stream ends when the provider emits its terminal sentinel or closes the
/// connection.
pub type DeltaStream = Pin<Box<dyn Stream<Item = Result<String, ProviderError>> + Send>>;

#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Single non-streaming completion.
    async fn complete(&self, system: &str, user: &str) -> Result<String, ProviderError>;

    /// Open a streaming completion. A non-2xx upstream response surfaces
    /// here, before any delta is produced.
    async fn stream(&self, system: &str, user: &str) -> Result<DeltaStream, ProviderError>;
}

#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed the text into a fixed-dimension vector. An empty vector is an
    /// error, never a silent fallback.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError>;
}

/// Extract the upstream `error.message` from a non-2xx response body, falling
/// back to a generic message carrying the status code.
pub(crate) async fn api_error(response: reqwest::Response) -> ProviderError {
    let status = response.status().as_u16();
    let message = match response.json::<serde_json::Value>().await {
        Ok(body) => body["error"]["message"].as_str().map(str::to_string),
        Err(_) => None,
    }
    .unwrap_or_else(|| format!("upstream returned status {status}"));

    ProviderError::Api { status, message }
}

/// Pump an upstream SSE response body into a delta channel.
///
/// `decode` maps one raw `data:` payload to its text delta; payloads it
/// cannot decode (malformed JSON, non-text events) are skipped. A dropped
/// receiver means the consumer cancelled, so reading stops without an error.
pub(crate) async fn pump_sse(
    response: reqwest::Response,
    tx: mpsc::Sender<Result<String, ProviderError>>,
    idle_timeout: Duration,
    decode: fn(&str) -> Option<String>,
) {
    let mut body = response.bytes_stream();
    let mut parser = SseParser::new();

    loop {
        let chunk = match tokio::time::timeout(idle_timeout, body.next()).await {
            Ok(Some(Ok(chunk))) => chunk,
            Ok(Some(Err(e))) => {
                let _ = tx.send(Err(ProviderError::Http(e))).await;
                return;
            }
            // Upstream closed without a sentinel; treat as end of stream.
            Ok(None) => return,
            Err(_) => {
                let _ = tx.send(Err(ProviderError::StreamTimeout)).await;
                return;
            }
        };

        for payload in parser.feed(&String::from_utf8_lossy(&chunk)) {
            if payload == DONE_SENTINEL {
                return;
            }
            let Some(text) = decode(&payload) else {
                continue;
            };
            if tx.send(Ok(text)).await.is_err() {
                tracing::debug!("delta receiver dropped, abandoning upstream stream");
                return;
            }
        }
    }
}
