//! Retrieval-augmented analyzer
//!
//! The core pipeline: compose the query, embed it, retrieve precedent
//! chunks, assemble the grounded prompt, then stream the generated analysis
//! back to the caller while logging the session off the response path.
//!
//! Failure policy follows the intake contract: embedding failure is fatal
//! (no retrieval is possible without a query vector), search failure
//! degrades to statute-only context, logging failure is absorbed, and a
//! consumer that goes away mid-stream is a cancellation, not an error.

use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use uuid::Uuid;

use crate::model::{IntakeRequest, SessionRecord};
use crate::provider::{DeltaStream, EmbeddingProvider, GenerationProvider, ProviderError};
use crate::service::prompt;
use crate::service::retriever::PrecedentRetriever;
use crate::service::session::{self, SessionStore};

const EVENT_CHANNEL_CAPACITY: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum AnalyzerError {
    #[error("scenario is required")]
    EmptyScenario,

    #[error("failed to embed the scenario: {0}")]
    Embedding(#[source] ProviderError),

    #[error("generation request failed: {0}")]
    Generation(#[source] ProviderError),
}

/// Event re-emitted to the API caller, already provider-agnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisEvent {
    Delta(String),
    Done,
}

/// An open analysis: the citation set is known before the first delta so the
/// caller can set response headers, then events arrive in generation order.
#[derive(Debug)]
pub struct AnalysisStream {
    pub session_id: Uuid,
    /// Deduplicated source file names drawn from the retrieved match set.
    pub sources: Vec<String>,
    pub events: ReceiverStream<AnalysisEvent>,
}

pub struct IntakeAnalyzer {
    embedder: Arc<dyn EmbeddingProvider>,
    generator: Arc<dyn GenerationProvider>,
    retriever: Arc<dyn PrecedentRetriever>,
    sessions: Arc<dyn SessionStore>,
}

impl IntakeAnalyzer {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        generator: Arc<dyn GenerationProvider>,
        retriever: Arc<dyn PrecedentRetriever>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            embedder,
            generator,
            retriever,
            sessions,
        }
    }

    pub async fn analyze(&self, request: &IntakeRequest) -> Result<AnalysisStream, AnalyzerError> {
        let scenario = request.scenario.trim();
        if scenario.is_empty() {
            return Err(AnalyzerError::EmptyScenario);
        }

        let session_id = request.session_id.unwrap_or_else(Uuid::new_v4);
        let clarifications = request
            .clarifications
            .as_deref()
            .filter(|c| !c.trim().is_empty());

        let full_query = prompt::compose_query(scenario, clarifications);
        let embedding = self
            .embedder
            .embed(prompt::truncate_chars(&full_query, prompt::EMBED_MAX_CHARS))
            .await
            .map_err(AnalyzerError::Embedding)?;

        let matches = match self.retriever.search(&embedding).await {
            Ok(matches) => matches,
            Err(e) => {
                tracing::warn!(error = %e, "Similarity search failed, proceeding without precedents");
                Vec::new()
            }
        };
        if matches.is_empty() {
            tracing::debug!(session_id = %session_id, "No precedents above threshold, statute-only analysis");
        }

        let assembled = prompt::assemble_context(&matches);

        // Pre-completion log, so an interrupted generation still leaves a
        // partial session. Fire-and-forget.
        let record = request
            .email
            .as_deref()
            .map(str::trim)
            .filter(|email| !email.is_empty())
            .map(|email| {
                SessionRecord::new(
                    session_id,
                    email.to_string(),
                    full_query.clone(),
                    clarifications.map(str::to_string),
                    assembled.sources.clone(),
                )
            });
        if let Some(record) = &record {
            session::persist_detached(Arc::clone(&self.sessions), record.clone());
        }

        let system = prompt::system_prompt(&assembled.context);
        let user = prompt::user_message(scenario, clarifications);
        let deltas = self
            .generator
            .stream(&system, &user)
            .await
            .map_err(AnalyzerError::Generation)?;

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let completion = record.map(|record| CompletionLog {
            store: Arc::clone(&self.sessions),
            record,
        });
        tokio::spawn(relay(deltas, tx, completion));

        Ok(AnalysisStream {
            session_id,
            sources: assembled.sources,
            events: ReceiverStream::new(rx),
        })
    }
}

struct CompletionLog {
    store: Arc<dyn SessionStore>,
    record: SessionRecord,
}

/// Forward provider deltas to the caller in order, accumulate the full text,
/// and upsert the finished session once the stream ends.
async fn relay(
    mut deltas: DeltaStream,
    tx: mpsc::Sender<AnalysisEvent>,
    completion: Option<CompletionLog>,
) {
    let mut result = String::new();

    while let Some(item) = deltas.next().await {
        match item {
            Ok(text) => {
                result.push_str(&text);
                if tx.send(AnalysisEvent::Delta(text)).await.is_err() {
                    // Consumer went away mid-stream: a cancellation, not a
                    // failure. Stop reading and skip the completion write.
                    tracing::debug!("Analysis consumer disconnected, dropping upstream stream");
                    return;
                }
            }
            Err(e) => {
                // The upstream stream broke mid-flight; the caller still gets
                // the terminal sentinel after whatever text arrived.
                tracing::warn!(error = %e, "Generation stream ended early");
                break;
            }
        }
    }

    let _ = tx.send(AnalysisEvent::Done).await;

    if let Some(log) = completion {
        let mut record = log.record;
        record.analysis_result = Some(result);
        session::persist_detached(log.store, record);
    }
}
