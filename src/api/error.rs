//! Unified API error handling
//!
//! Every failure surfaced before (or instead of) a stream becomes a non-2xx
//! response with the JSON body `{"error": <message>}`.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde::Serialize;

use crate::service::analyzer::AnalyzerError;

/// Standard error response format
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    /// Human-readable error message
    pub error: String,
}

/// Unified API error type
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ApiError {
    /// Bad request / validation error (400)
    #[error("{0}")]
    BadRequest(String),

    /// Upstream provider rejected or failed the request (502)
    #[error("{0}")]
    Upstream(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        tracing::error!(
            status = status.as_u16(),
            message = %self,
            "API error"
        );

        HttpResponse::build(status).json(ErrorResponse {
            error: self.to_string(),
        })
    }
}

impl From<AnalyzerError> for ApiError {
    fn from(err: AnalyzerError) -> Self {
        match err {
            AnalyzerError::EmptyScenario => ApiError::BadRequest(err.to_string()),
            AnalyzerError::Embedding(_) | AnalyzerError::Generation(_) => {
                ApiError::Upstream(err.to_string())
            }
        }
    }
}
