//! Session logging
//!
//! Session writes are best-effort: they must never block or fail the
//! user-facing response, so they are dispatched as detached tasks and their
//! failures are logged only.

use std::sync::Arc;

use async_trait::async_trait;

use crate::db::repository::SessionRepository;
use crate::db::DbError;
use crate::model::SessionRecord;

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Idempotent upsert keyed by the record's session id.
    async fn persist(&self, record: &SessionRecord) -> Result<(), DbError>;
}

#[async_trait]
impl SessionStore for SessionRepository {
    async fn persist(&self, record: &SessionRecord) -> Result<(), DbError> {
        self.upsert(record).await
    }
}

/// Dispatch a session write without blocking the response path.
pub fn persist_detached(store: Arc<dyn SessionStore>, record: SessionRecord) {
    tokio::spawn(async move {
        if let Err(e) = store.persist(&record).await {
            tracing::warn!(session_id = %record.id, error = %e, "Session log write failed");
        }
    });
}
