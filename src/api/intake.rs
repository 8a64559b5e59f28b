//! Intake endpoint: clarification drilling and streamed RAG analysis

use actix_web::{HttpResponse, post, web};
use futures::StreamExt;
use serde_json::json;

use super::error::ApiError;
use crate::model::{DrillResponse, IntakeMode, IntakeRequest};
use crate::service::analyzer::{AnalysisEvent, IntakeAnalyzer};
use crate::service::ClarificationPlanner;

/// Response header carrying the JSON array of cited source file names. Set
/// before the body starts streaming.
pub const SOURCES_HEADER: &str = "X-CWI-Sources";

/// Run one intake operation
///
/// `mode=drill` answers with clarifying questions as JSON; `mode=analyze`
/// answers with a `text/event-stream` body in the OpenAI-compatible delta
/// shape, terminated by a `[DONE]` sentinel event.
#[utoipa::path(
    post,
    path = "/v1/intake",
    request_body = IntakeRequest,
    responses(
        (status = 200, description = "Clarifying questions (drill) or SSE analysis stream (analyze)", body = DrillResponse),
        (status = 400, description = "Missing or empty scenario", body = super::error::ErrorResponse),
        (status = 502, description = "Upstream provider failure", body = super::error::ErrorResponse)
    ),
    tag = "intake"
)]
#[post("/v1/intake")]
pub async fn intake(
    planner: web::Data<ClarificationPlanner>,
    analyzer: web::Data<IntakeAnalyzer>,
    body: web::Json<IntakeRequest>,
) -> Result<HttpResponse, ApiError> {
    let request = body.into_inner();

    if request.scenario.trim().is_empty() {
        return Err(ApiError::BadRequest("scenario is required".to_string()));
    }

    match request.mode {
        IntakeMode::Drill => {
            let questions = planner.plan(&request.scenario).await;
            Ok(HttpResponse::Ok().json(DrillResponse { questions }))
        }
        IntakeMode::Analyze => {
            let stream = analyzer.analyze(&request).await?;

            let sources = serde_json::to_string(&stream.sources)
                .unwrap_or_else(|_| "[]".to_string());

            let body = stream
                .events
                .map(|event| Ok::<web::Bytes, actix_web::Error>(encode_event(&event)));

            Ok(HttpResponse::Ok()
                .content_type("text/event-stream")
                .insert_header(("Cache-Control", "no-cache"))
                .insert_header((SOURCES_HEADER, sources))
                .streaming(body))
        }
    }
}

/// One outward SSE frame in the provider-agnostic shape.
fn encode_event(event: &AnalysisEvent) -> web::Bytes {
    let frame = match event {
        AnalysisEvent::Delta(text) => format!(
            "data: {}\n\n",
            json!({ "choices": [{ "delta": { "content": text } }] })
        ),
        AnalysisEvent::Done => "data: [DONE]\n\n".to_string(),
    };
    web::Bytes::from(frame)
}

/// Configure intake routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(intake);
}
