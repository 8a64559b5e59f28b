//! Repositories for precedent retrieval and session logging

use pgvector::Vector;
use sqlx::PgPool;

use super::models::PrecedentMatchRow;
use super::DbError;
use crate::model::{PrecedentMatch, SessionRecord};

/// Read-only access to the precedent vector store
#[derive(Clone)]
pub struct PrecedentRepository {
    pool: PgPool,
}

impl PrecedentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Top-K cosine similarity search, filtered by a minimum similarity
    /// threshold, ordered by descending similarity.
    pub async fn match_documents(
        &self,
        embedding: &[f32],
        match_count: i64,
        match_threshold: f64,
    ) -> Result<Vec<PrecedentMatch>, DbError> {
        let query_vector = Vector::from(embedding.to_vec());

        let rows: Vec<PrecedentMatchRow> = sqlx::query_as(
            r#"
            SELECT content, file_name, partner_author,
                   1 - (embedding <=> $1) AS similarity
            FROM precedent_documents
            WHERE embedding IS NOT NULL
              AND 1 - (embedding <=> $1) >= $2
            ORDER BY embedding <=> $1
            LIMIT $3
            "#,
        )
        .bind(&query_vector)
        .bind(match_threshold)
        .bind(match_count)
        .fetch_all(&self.pool)
        .await?;

        tracing::debug!(matches = rows.len(), "Similarity search complete");

        Ok(rows.into_iter().map(|r| r.into_domain()).collect())
    }
}

/// Write access to the intake session log
#[derive(Clone)]
pub struct SessionRepository {
    pool: PgPool,
}

impl SessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert or update a session record, keyed by session id. A completed
    /// analysis is never overwritten with NULL by a later partial write.
    pub async fn upsert(&self, record: &SessionRecord) -> Result<(), DbError> {
        let sources = serde_json::to_value(&record.sources_cited)
            .map_err(|e| DbError::Serialization(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO cwi_sessions (
                id, email, query, clarifications, sources_cited,
                analysis_result, session_origin
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE SET
                email = EXCLUDED.email,
                query = EXCLUDED.query,
                clarifications = EXCLUDED.clarifications,
                sources_cited = EXCLUDED.sources_cited,
                analysis_result = COALESCE(EXCLUDED.analysis_result, cwi_sessions.analysis_result),
                updated_at = NOW()
            "#,
        )
        .bind(record.id)
        .bind(&record.email)
        .bind(&record.query)
        .bind(&record.clarifications)
        .bind(&sources)
        .bind(&record.analysis_result)
        .bind(&record.session_origin)
        .execute(&self.pool)
        .await?;

        tracing::debug!(session_id = %record.id, "Upserted intake session");
        Ok(())
    }
}
