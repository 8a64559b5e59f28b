//! Precedent retrieval strategies
//!
//! The analyzer depends on the `PrecedentRetriever` trait only, so the
//! vector-backed implementation and the null implementation (for deployments
//! without a precedent store) are interchangeable at construction time.

use async_trait::async_trait;

use crate::db::repository::PrecedentRepository;
use crate::db::DbError;
use crate::model::PrecedentMatch;

/// Top-K returned per query.
pub const MATCH_COUNT: i64 = 5;

/// Minimum cosine similarity (0-1 scale) for a chunk to be considered
/// relevant.
pub const MATCH_THRESHOLD: f64 = 0.65;

#[derive(Debug, thiserror::Error)]
pub enum RetrieverError {
    #[error("similarity search failed: {0}")]
    Search(#[from] DbError),
}

#[async_trait]
pub trait PrecedentRetriever: Send + Sync {
    /// Return matches ordered by descending similarity, truncated to top-K
    /// and filtered by the similarity threshold.
    async fn search(&self, embedding: &[f32]) -> Result<Vec<PrecedentMatch>, RetrieverError>;
}

/// Retrieval against the pgvector precedent store.
pub struct VectorRetriever {
    repository: PrecedentRepository,
}

impl VectorRetriever {
    pub fn new(repository: PrecedentRepository) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl PrecedentRetriever for VectorRetriever {
    async fn search(&self, embedding: &[f32]) -> Result<Vec<PrecedentMatch>, RetrieverError> {
        let matches = self
            .repository
            .match_documents(embedding, MATCH_COUNT, MATCH_THRESHOLD)
            .await?;
        Ok(matches)
    }
}

/// Always returns zero matches; every analysis runs statute-only.
pub struct NullRetriever;

#[async_trait]
impl PrecedentRetriever for NullRetriever {
    async fn search(&self, _embedding: &[f32]) -> Result<Vec<PrecedentMatch>, RetrieverError> {
        Ok(Vec::new())
    }
}
