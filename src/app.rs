//! Application state and service initialization
//!
//! This module centralizes all service initialization and dependency injection,
//! making it easier to manage the application lifecycle and test services.

use std::sync::Arc;

use sqlx::PgPool;

use crate::db::repository::{PrecedentRepository, SessionRepository};
use crate::model::config::ENV_GENERATION_API_KEY;
use crate::model::{Config, ProviderKind};
use crate::provider::gemini::GeminiClient;
use crate::provider::openai::OpenAiClient;
use crate::provider::{EmbeddingProvider, GenerationProvider};
use crate::service::{
    ClarificationPlanner, IntakeAnalyzer, NullRetriever, PrecedentRetriever, VectorRetriever,
};

/// Application state containing all services and shared resources
pub struct AppState {
    /// Database connection pool
    pub db_pool: PgPool,
    /// Clarification drilling service
    pub planner: Arc<ClarificationPlanner>,
    /// Retrieval-augmented analysis service
    pub analyzer: Arc<IntakeAnalyzer>,
}

impl AppState {
    /// Initialize all services and build application state
    ///
    /// This performs:
    /// 1. Database connection and schema initialization
    /// 2. Provider client construction (requires a generation API key)
    /// 3. Service dependency graph construction
    pub async fn new(config: &Config) -> Result<Self, AppError> {
        // Initialize PostgreSQL database
        let db_pool = crate::db::create_pool()
            .await
            .map_err(|e| AppError::DatabaseInit(e.to_string()))?;

        // Initialize database schema
        crate::db::init_schema(&db_pool)
            .await
            .map_err(|e| AppError::DatabaseInit(e.to_string()))?;

        let generation_api_key = config
            .generation_api_key
            .clone()
            .ok_or(AppError::MissingConfig(ENV_GENERATION_API_KEY))?;

        // The embedding endpoint accepts the generation key unless a
        // separate one is configured.
        let embedding_api_key = config
            .embedding_api_key
            .clone()
            .unwrap_or_else(|| generation_api_key.clone());

        let (generator, embedder) = Self::build_providers(
            config,
            generation_api_key,
            embedding_api_key,
        );

        let retriever: Arc<dyn PrecedentRetriever> = if config.retrieval.enabled {
            Arc::new(VectorRetriever::new(PrecedentRepository::new(
                db_pool.clone(),
            )))
        } else {
            tracing::warn!("Precedent retrieval disabled, analyses will be statute-only");
            Arc::new(NullRetriever)
        };

        let sessions = Arc::new(SessionRepository::new(db_pool.clone()));

        let planner = Arc::new(ClarificationPlanner::new(Arc::clone(&generator)));
        let analyzer = Arc::new(IntakeAnalyzer::new(
            embedder, generator, retriever, sessions,
        ));

        Ok(Self {
            db_pool,
            planner,
            analyzer,
        })
    }

    /// Build generation and embedding clients for the configured provider
    fn build_providers(
        config: &Config,
        api_key: String,
        embedding_api_key: String,
    ) -> (Arc<dyn GenerationProvider>, Arc<dyn EmbeddingProvider>) {
        match config.provider.kind {
            ProviderKind::Gemini => {
                let client = Arc::new(GeminiClient::new(
                    &config.provider,
                    &config.limits,
                    api_key,
                    embedding_api_key,
                ));
                tracing::info!(
                    model = %config.provider.generation_model,
                    "Gemini provider initialized"
                );
                (client.clone(), client)
            }
            ProviderKind::OpenAi => {
                let client = Arc::new(OpenAiClient::new(
                    &config.provider,
                    &config.limits,
                    api_key,
                    embedding_api_key,
                ));
                tracing::info!(
                    model = %config.provider.generation_model,
                    "OpenAI-compatible provider initialized"
                );
                (client.clone(), client)
            }
        }
    }
}

/// Application-level errors
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum AppError {
    /// Database initialization failed
    #[error("Database initialization failed: {0}")]
    DatabaseInit(String),

    /// Missing required configuration
    #[error("Missing required configuration: {0}")]
    MissingConfig(&'static str),
}
