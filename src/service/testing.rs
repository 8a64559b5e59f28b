//! Shared test doubles for the service layer.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use crate::db::DbError;
use crate::model::{PrecedentMatch, SessionRecord};
use crate::provider::{DeltaStream, EmbeddingProvider, GenerationProvider, ProviderError};
use crate::service::retriever::{PrecedentRetriever, RetrieverError};
use crate::service::session::SessionStore;

/// Generation provider stub. Records the prompts it saw so tests can assert
/// on context assembly.
pub(crate) struct StubGenerator {
    completion: Result<String, String>,
    stream_deltas: Vec<String>,
    stream_open_error: Option<String>,
    pub complete_calls: AtomicUsize,
    pub stream_calls: Arc<AtomicUsize>,
    pub last_system: Mutex<String>,
    pub last_user: Mutex<String>,
}

impl StubGenerator {
    fn new(completion: Result<String, String>, deltas: &[&str], open_error: Option<&str>) -> Self {
        Self {
            completion,
            stream_deltas: deltas.iter().map(|d| d.to_string()).collect(),
            stream_open_error: open_error.map(str::to_string),
            complete_calls: AtomicUsize::new(0),
            stream_calls: Arc::new(AtomicUsize::new(0)),
            last_system: Mutex::new(String::new()),
            last_user: Mutex::new(String::new()),
        }
    }

    /// Non-streaming calls answer with `text`; streaming is unavailable.
    pub fn completing(text: &str) -> Self {
        Self::new(Ok(text.to_string()), &[], Some("streaming not stubbed"))
    }

    /// Every call fails with an upstream-style error.
    pub fn failing(message: &str) -> Self {
        Self::new(Err(message.to_string()), &[], Some(message))
    }

    /// Streaming calls yield `deltas` in order, then end.
    pub fn streaming(deltas: &[&str]) -> Self {
        Self::new(Err("completion not stubbed".to_string()), deltas, None)
    }

    fn record_prompts(&self, system: &str, user: &str) {
        *self.last_system.lock().unwrap() = system.to_string();
        *self.last_user.lock().unwrap() = user.to_string();
    }
}

#[async_trait]
impl GenerationProvider for StubGenerator {
    async fn complete(&self, system: &str, user: &str) -> Result<String, ProviderError> {
        self.complete_calls.fetch_add(1, Ordering::SeqCst);
        self.record_prompts(system, user);
        self.completion
            .clone()
            .map_err(|message| ProviderError::Api {
                status: 500,
                message,
            })
    }

    async fn stream(&self, system: &str, user: &str) -> Result<DeltaStream, ProviderError> {
        self.stream_calls.fetch_add(1, Ordering::SeqCst);
        self.record_prompts(system, user);

        if let Some(message) = &self.stream_open_error {
            return Err(ProviderError::Api {
                status: 500,
                message: message.clone(),
            });
        }

        let deltas: Vec<Result<String, ProviderError>> =
            self.stream_deltas.iter().cloned().map(Ok).collect();
        Ok(Box::pin(futures::stream::iter(deltas)))
    }
}

/// Embedding provider stub.
pub(crate) struct StubEmbedder {
    result: Result<Vec<f32>, String>,
    pub calls: AtomicUsize,
    pub last_input: Mutex<String>,
}

impl StubEmbedder {
    pub fn returning(embedding: Vec<f32>) -> Self {
        Self {
            result: Ok(embedding),
            calls: AtomicUsize::new(0),
            last_input: Mutex::new(String::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            result: Err(message.to_string()),
            calls: AtomicUsize::new(0),
            last_input: Mutex::new(String::new()),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for StubEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_input.lock().unwrap() = text.to_string();
        self.result
            .clone()
            .map_err(ProviderError::InvalidResponse)
    }
}

/// Retriever stub: fixed matches or a guaranteed search error.
pub(crate) struct StubRetriever {
    matches: Vec<PrecedentMatch>,
    fail: bool,
}

impl StubRetriever {
    pub fn matching(matches: Vec<PrecedentMatch>) -> Self {
        Self {
            matches,
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            matches: Vec::new(),
            fail: true,
        }
    }
}

#[async_trait]
impl PrecedentRetriever for StubRetriever {
    async fn search(&self, _embedding: &[f32]) -> Result<Vec<PrecedentMatch>, RetrieverError> {
        if self.fail {
            return Err(RetrieverError::Search(DbError::Serialization(
                "stubbed search failure".to_string(),
            )));
        }
        Ok(self.matches.clone())
    }
}

/// In-memory session store keyed by session id, mirroring the upsert
/// contract of the Postgres repository.
#[derive(Default)]
pub(crate) struct MemorySessionStore {
    records: Mutex<HashMap<Uuid, SessionRecord>>,
}

impl MemorySessionStore {
    pub fn get(&self, id: &Uuid) -> Option<SessionRecord> {
        self.records.lock().unwrap().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn persist(&self, record: &SessionRecord) -> Result<(), DbError> {
        let mut records = self.records.lock().unwrap();
        let entry = records.entry(record.id).or_insert_with(|| record.clone());
        let mut updated = record.clone();
        // A completed analysis is never clobbered by a later partial write.
        if updated.analysis_result.is_none() {
            updated.analysis_result = entry.analysis_result.clone();
        }
        *entry = updated;
        Ok(())
    }
}

/// Counts WARN and ERROR events so tests can assert clean cancellation.
#[derive(Clone, Default)]
pub(crate) struct LevelRecorder {
    problems: Arc<AtomicUsize>,
}

impl LevelRecorder {
    pub fn problems(&self) -> usize {
        self.problems.load(Ordering::SeqCst)
    }
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for LevelRecorder {
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let level = *event.metadata().level();
        if level == tracing::Level::ERROR || level == tracing::Level::WARN {
            self.problems.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Poll `predicate` until it holds or a short deadline passes. Detached
/// session writes land a beat after the stream ends.
pub(crate) async fn wait_until(predicate: impl Fn() -> bool) {
    for _ in 0..100 {
        if predicate() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached within deadline");
}
