//! Gemini API adapter
//!
//! Speaks `generateContent`, `streamGenerateContent?alt=sse`, and
//! `embedContent` on the Generative Language API. Stream deltas live at
//! `candidates[0].content.parts[0].text`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use super::{DeltaStream, EmbeddingProvider, GenerationProvider, ProviderError, api_error, pump_sse};
use crate::model::{LimitConfig, ProviderConfig};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

const TEMPERATURE: f64 = 0.2;
const MAX_OUTPUT_TOKENS: u32 = 1400;
const DELTA_CHANNEL_CAPACITY: usize = 32;

pub struct GeminiClient {
    http: Client,
    base_url: String,
    generation_model: String,
    embedding_model: String,
    api_key: String,
    embedding_api_key: String,
    request_timeout: Duration,
    stream_idle_timeout: Duration,
}

impl GeminiClient {
    pub fn new(
        config: &ProviderConfig,
        limits: &LimitConfig,
        api_key: String,
        embedding_api_key: String,
    ) -> Self {
        Self {
            http: Client::new(),
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            generation_model: config.generation_model.clone(),
            embedding_model: config.embedding_model.clone(),
            api_key,
            embedding_api_key,
            request_timeout: limits.request_timeout(),
            stream_idle_timeout: limits.stream_idle_timeout(),
        }
    }

    fn generation_body(system: &str, user: &str) -> Value {
        let mut body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": user }] }],
            "generationConfig": {
                "temperature": TEMPERATURE,
                "maxOutputTokens": MAX_OUTPUT_TOKENS,
            },
        });
        if !system.is_empty() {
            body["system_instruction"] = json!({ "parts": [{ "text": system }] });
        }
        body
    }

    fn decode_delta(payload: &str) -> Option<String> {
        let value: Value = serde_json::from_str(payload).ok()?;
        value["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .map(str::to_string)
    }
}

#[async_trait]
impl GenerationProvider for GeminiClient {
    async fn complete(&self, system: &str, user: &str) -> Result<String, ProviderError> {
        let url = format!(
            "{}/{}:generateContent?key={}",
            self.base_url, self.generation_model, self.api_key
        );

        let response = self
            .http
            .post(&url)
            .timeout(self.stream_idle_timeout)
            .json(&Self::generation_body(system, user))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let value: Value = response.json().await?;
        value["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ProviderError::InvalidResponse("no text candidate in response".into()))
    }

    async fn stream(&self, system: &str, user: &str) -> Result<DeltaStream, ProviderError> {
        let url = format!(
            "{}/{}:streamGenerateContent?alt=sse&key={}",
            self.base_url, self.generation_model, self.api_key
        );

        let response = self
            .http
            .post(&url)
            .json(&Self::generation_body(system, user))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let (tx, rx) = mpsc::channel(DELTA_CHANNEL_CAPACITY);
        let idle = self.stream_idle_timeout;
        tokio::spawn(pump_sse(response, tx, idle, Self::decode_delta));

        Ok(Box::pin(ReceiverStream::new(rx)))
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        let url = format!(
            "{}/{}:embedContent?key={}",
            self.base_url, self.embedding_model, self.embedding_api_key
        );

        let body = json!({
            "model": format!("models/{}", self.embedding_model),
            "content": { "parts": [{ "text": text }] },
            "taskType": "RETRIEVAL_QUERY",
        });

        let response = self
            .http
            .post(&url)
            .timeout(self.request_timeout)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let value: Value = response.json().await?;
        let embedding: Vec<f32> = value["embedding"]["values"]
            .as_array()
            .map(|values| {
                values
                    .iter()
                    .filter_map(|v| v.as_f64())
                    .map(|v| v as f32)
                    .collect()
            })
            .unwrap_or_default();

        if embedding.is_empty() {
            return Err(ProviderError::InvalidResponse(
                "embedding response contained no values".into(),
            ));
        }

        Ok(embedding)
    }
}
