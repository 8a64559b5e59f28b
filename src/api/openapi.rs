//! OpenAPI specification endpoints

use actix_web::{HttpResponse, Responder, get};
use utoipa::OpenApi;

use crate::api::{error, health, intake};
use crate::model;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Clearwater Intelligence Desk API",
        description = "Retrieval-augmented legal intake: clarification drilling and streamed precedent-grounded analysis",
        version = env!("CARGO_PKG_VERSION")
    ),
    paths(
        intake::intake,
        health::liveness,
        health::readiness
    ),
    components(schemas(
        model::IntakeRequest,
        model::IntakeMode,
        model::DrillResponse,
        error::ErrorResponse,
        health::HealthStatus,
        health::ReadinessStatus,
        health::DependencyHealth
    )),
    tags(
        (name = "intake", description = "Scenario intake operations"),
        (name = "health", description = "Service health probes")
    )
)]
pub struct ApiDoc;

/// Serve OpenAPI JSON specification
#[get("/openapi.json")]
pub async fn openapi_json() -> impl Responder {
    HttpResponse::Ok().json(ApiDoc::openapi())
}

/// Serve OpenAPI YAML specification
#[get("/openapi.yaml")]
pub async fn openapi_yaml() -> impl Responder {
    HttpResponse::Ok()
        .content_type("text/yaml")
        .body(ApiDoc::openapi().to_yaml().unwrap())
}

/// Configure OpenAPI routes
pub fn configure(cfg: &mut actix_web::web::ServiceConfig) {
    cfg.service(openapi_json).service(openapi_yaml);
}
