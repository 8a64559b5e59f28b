//! Database module for PostgreSQL persistence

pub mod models;
pub mod repository;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::env;

// Environment variable names
const ENV_POSTGRES_HOST: &str = "CWI_POSTGRES_HOST";
const ENV_POSTGRES_PORT: &str = "CWI_POSTGRES_PORT";
const ENV_POSTGRES_USER: &str = "CWI_POSTGRES_USER";
const ENV_POSTGRES_PASSWORD: &str = "CWI_POSTGRES_PASSWORD";
const ENV_POSTGRES_DB: &str = "CWI_POSTGRES_DB";

// Default values
const DEFAULT_POSTGRES_HOST: &str = "127.0.0.1";
const DEFAULT_POSTGRES_PORT: &str = "5432";
const DEFAULT_POSTGRES_USER: &str = "cwi_desk";
const DEFAULT_POSTGRES_PASSWORD: &str = "cwi_desk";
const DEFAULT_POSTGRES_DB: &str = "cwi_desk";

/// Dimension of the precedent embedding column (text-embedding-004).
pub const EMBEDDING_DIMENSION: usize = 768;

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("Database connection error: {0}")]
    Connection(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Create a new database connection pool
pub async fn create_pool() -> Result<PgPool, DbError> {
    let host = env::var(ENV_POSTGRES_HOST).unwrap_or_else(|_| DEFAULT_POSTGRES_HOST.to_string());
    let port = env::var(ENV_POSTGRES_PORT).unwrap_or_else(|_| DEFAULT_POSTGRES_PORT.to_string());
    let user = env::var(ENV_POSTGRES_USER).unwrap_or_else(|_| DEFAULT_POSTGRES_USER.to_string());
    let password =
        env::var(ENV_POSTGRES_PASSWORD).unwrap_or_else(|_| DEFAULT_POSTGRES_PASSWORD.to_string());
    let database = env::var(ENV_POSTGRES_DB).unwrap_or_else(|_| DEFAULT_POSTGRES_DB.to_string());

    let database_url = format!(
        "postgres://{}:{}@{}:{}/{}",
        user, password, host, port, database
    );

    tracing::debug!(host = %host, port = %port, database = %database, "Connecting to PostgreSQL");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await?;

    tracing::info!(host = %host, port = %port, "PostgreSQL connection established");

    Ok(pool)
}

/// Initialize database schema
///
/// `precedent_documents` is populated by the offline ingestion pipeline and
/// is read-only from this service's perspective; `cwi_sessions` holds the
/// intake session log.
pub async fn init_schema(pool: &PgPool) -> Result<(), DbError> {
    sqlx::query("CREATE EXTENSION IF NOT EXISTS vector")
        .execute(pool)
        .await?;

    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS precedent_documents (
            id BIGSERIAL PRIMARY KEY,
            content TEXT NOT NULL,
            embedding VECTOR({EMBEDDING_DIMENSION}),
            file_name TEXT NOT NULL,
            folder_path TEXT,
            partner_author TEXT,
            chunk_index INTEGER NOT NULL DEFAULT 0,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#
    ))
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS cwi_sessions (
            id UUID PRIMARY KEY,
            email TEXT NOT NULL,
            query TEXT NOT NULL,
            clarifications TEXT,
            sources_cited JSONB NOT NULL DEFAULT '[]',
            analysis_result TEXT,
            session_origin TEXT NOT NULL DEFAULT 'web',
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes separately
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_precedent_documents_embedding \
         ON precedent_documents USING ivfflat (embedding vector_cosine_ops) WITH (lists = 100)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_precedent_documents_file_name \
         ON precedent_documents(file_name)",
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_cwi_sessions_email ON cwi_sessions(email)")
        .execute(pool)
        .await?;

    tracing::info!("Database schema initialized");

    Ok(())
}
