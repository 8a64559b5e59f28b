//! Domain types for the intake pipeline

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Which intake operation the caller wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum IntakeMode {
    /// Generate up to two clarifying questions before full analysis.
    Drill,
    /// Embed, retrieve precedents, and stream a grounded analysis.
    Analyze,
}

/// Request body for `POST /v1/intake`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct IntakeRequest {
    /// Free-text description of the legal matter.
    pub scenario: String,
    /// Contact email; when present, the session is logged.
    #[serde(default)]
    pub email: Option<String>,
    /// Formatted Q/A pairs collected after drilling.
    #[serde(default)]
    pub clarifications: Option<String>,
    pub mode: IntakeMode,
    /// Session identifier; generated server-side when absent. Session writes
    /// are upserts keyed by this id, so retried requests collapse into one
    /// logical record.
    #[serde(default)]
    pub session_id: Option<Uuid>,
}

/// Response body for `mode=drill`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DrillResponse {
    pub questions: Vec<String>,
}

/// One precedent chunk returned by the similarity search, scored for the
/// current query. Ordered by descending similarity, already filtered by the
/// retrieval threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct PrecedentMatch {
    pub content: String,
    pub file_name: String,
    pub partner_author: Option<String>,
    /// Cosine similarity on a 0-1 scale.
    pub similarity: f32,
}

/// A logged intake session. Written pre-completion (so an interrupted
/// generation still leaves a record) and upserted again with the finished
/// analysis text.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRecord {
    pub id: Uuid,
    pub email: String,
    /// The composed query: scenario plus formatted clarifications.
    pub query: String,
    pub clarifications: Option<String>,
    /// Deduplicated source file names, first-seen order.
    pub sources_cited: Vec<String>,
    /// Full analysis text, set once the stream completes.
    pub analysis_result: Option<String>,
    pub session_origin: String,
}

impl SessionRecord {
    pub fn new(
        id: Uuid,
        email: String,
        query: String,
        clarifications: Option<String>,
        sources_cited: Vec<String>,
    ) -> Self {
        Self {
            id,
            email,
            query,
            clarifications,
            sources_cited,
            analysis_result: None,
            session_origin: "web".to_string(),
        }
    }
}
