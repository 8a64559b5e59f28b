use actix_cors::Cors;
use actix_web::{App, HttpServer, web};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cwi_desk::api;
use cwi_desk::app::AppState;
use cwi_desk::model::Config;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present (ignore if missing)
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    let bind_addr = config.bind_addr();

    let state = AppState::new(&config)
        .await
        .map_err(|e| std::io::Error::other(e.to_string()))?;

    let db_pool = web::Data::new(state.db_pool.clone());
    let planner = web::Data::from(state.planner);
    let analyzer = web::Data::from(state.analyzer);

    tracing::info!("Starting Clearwater Intelligence Desk server on {}", bind_addr);

    HttpServer::new(move || {
        // Browser clients call the intake endpoint cross-origin and need to
        // read the citation header from the streamed response.
        let cors = Cors::default()
            .allow_any_origin()
            .allowed_methods(vec!["GET", "POST", "OPTIONS"])
            .allowed_headers(vec![
                "authorization",
                "x-client-info",
                "apikey",
                "content-type",
            ])
            .expose_headers(vec![api::intake::SOURCES_HEADER]);

        App::new()
            .wrap(cors)
            .app_data(db_pool.clone())
            .app_data(planner.clone())
            .app_data(analyzer.clone())
            .configure(api::intake::configure)
            .configure(api::health::configure)
            .configure(api::openapi::configure)
    })
    .bind(&bind_addr)?
    .run()
    .await
}
