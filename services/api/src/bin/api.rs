//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{generation_client, DbAdapter, LogMailer, OpenAiGenerationAdapter},
    config::Config,
    error::ApiError,
    web::{self, state::AppState, ApiDoc},
};
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let db_adapter = Arc::new(DbAdapter::new(db_pool));
    info!("Running database migrations...");
    db_adapter.run_migrations().await?;
    info!("Database migrations complete.");

    // --- 3. Initialize Service Adapters ---
    let generation_client = match config.gemini_api_key.as_ref() {
        Some(key) => Some(generation_client(key, &config.generation_api_base)),
        None => {
            warn!("GEMINI_API_KEY is not set; tutor requests will fail until it is configured.");
            None
        }
    };
    let generation_adapter = Arc::new(OpenAiGenerationAdapter::new(
        generation_client,
        config.tutor_model.clone(),
    ));
    let mailer = Arc::new(LogMailer::new());

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState::new(
        config.clone(),
        db_adapter,
        mailer,
        generation_adapter,
    ));

    // --- 5. Create the Web Router ---
    let api_router = web::router(app_state).layer(web::cors_layer(&config)?);

    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
