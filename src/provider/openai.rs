//! OpenAI-compatible API adapter
//!
//! Covers the hosted OpenAI API and any compatible proxy: `/chat/completions`
//! (optionally with `stream: true`) and `/embeddings`. Stream deltas live at
//! `choices[0].delta.content`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use super::{DeltaStream, EmbeddingProvider, GenerationProvider, ProviderError, api_error, pump_sse};
use crate::db::EMBEDDING_DIMENSION;
use crate::model::{LimitConfig, ProviderConfig};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

const TEMPERATURE: f64 = 0.2;
const MAX_TOKENS: u32 = 1400;
const DELTA_CHANNEL_CAPACITY: usize = 32;

pub struct OpenAiClient {
    http: Client,
    base_url: String,
    generation_model: String,
    embedding_model: String,
    api_key: String,
    embedding_api_key: String,
    request_timeout: Duration,
    stream_idle_timeout: Duration,
}

impl OpenAiClient {
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

    fn chat_body(&self, system: &str, user: &str, stream: bool) -> Value {
        let mut messages = Vec::new();
        if !system.is_empty() {
            messages.push(json!({ "role": "system", "content": system }));
        }
        messages.push(json!({ "role": "user", "content": user }));

        json!({
            "model": self.generation_model,
            "messages": messages,
            "temperature": TEMPERATURE,
            "max_tokens": MAX_TOKENS,
            "stream": stream,
        })
    }

    fn decode_delta(payload: &str) -> Option<String> {
        let value: Value = serde_json::from_str(payload).ok()?;
        value["choices"][0]["delta"]["content"]
            .as_str()
            .map(str::to_string)
    }
}

#[async_trait]
impl GenerationProvider for OpenAiClient {
    async fn complete(&self, system: &str, user: &str) -> Result<String, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .timeout(self.stream_idle_timeout)
            .json(&self.chat_body(system, user, false))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let value: Value = response.json().await?;
        value["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ProviderError::InvalidResponse("no message content in response".into()))
    }

    async fn stream(&self, system: &str, user: &str) -> Result<DeltaStream, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&self.chat_body(system, user, true))
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
impl EmbeddingProvider for OpenAiClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        let url = format!("{}/embeddings", self.base_url);

        // Dimensions pinned so either provider can serve the same column.
        let body = json!({
            "model": self.embedding_model,
            "input": text,
            "dimensions": EMBEDDING_DIMENSION,
        });

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.embedding_api_key)
            .timeout(self.request_timeout)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let value: Value = response.json().await?;
        let embedding: Vec<f32> = value["data"][0]["embedding"]
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LimitConfig, ProviderConfig};

    fn client() -> OpenAiClient {
        OpenAiClient::new(
            &ProviderConfig {
                kind: crate::model::ProviderKind::OpenAi,
                generation_model: "gpt-4o-mini".to_string(),
                embedding_model: "text-embedding-3-small".to_string(),
                base_url: None,
            },
            &LimitConfig::default(),
            "test-key".to_string(),
            "test-key".to_string(),
        )
    }

    #[test]
    fn chat_body_includes_system_and_stream_flag() {
        let body = client().chat_body("be terse", "hello", true);

        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "hello");
        assert_eq!(body["stream"], true);
        assert_eq!(body["model"], "gpt-4o-mini");
    }

    #[test]
    fn chat_body_without_system_message() {
        let body = client().chat_body("", "hello", false);
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["stream"], false);
    }

    #[test]
    fn decodes_text_delta() {
        let payload = r#"{"choices":[{"delta":{"content":"Analysis"}}]}"#;
        assert_eq!(
            OpenAiClient::decode_delta(payload),
            Some("Analysis".to_string())
        );
    }

    #[test]
    fn skips_role_and_finish_events() {
        assert_eq!(
            OpenAiClient::decode_delta(r#"{"choices":[{"delta":{"role":"assistant"}}]}"#),
            None
        );
        assert_eq!(
            OpenAiClient::decode_delta(r#"{"choices":[{"finish_reason":"stop","delta":{}}]}"#),
            None
        );
        assert_eq!(OpenAiClient::decode_delta("garbage"), None);
    }
}
