// Main entry point for the intake server

use std::sync::Arc;

use anyhow::{Context, Result};
use intake_core::{
    kernel::{
        BaseCompanyExtractor, KeywordExtractor, OpenAIExtractor, PostgresCompanyStore, ServerDeps,
    },
    server::{build_app, AppState},
    Config,
};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,intake_core=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting company intake server");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!("Configuration loaded");

    // Connect to database
    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connected");

    // Run migrations
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Migrations complete");

    let extractor: Arc<dyn BaseCompanyExtractor> = match &config.openai_api_key {
        Some(api_key) => {
            let extractor = OpenAIExtractor::new(api_key.clone())
                .with_base_url(config.openai_base_url.clone())
                .with_model(config.openai_model.clone());
            tracing::info!(model = %extractor.model(), "Using OpenAI extractor");
            Arc::new(extractor)
        }
        None => {
            tracing::warn!("OPENAI_API_KEY not set, falling back to keyword extractor");
            Arc::new(KeywordExtractor::new().with_latency(config.extraction_latency))
        }
    };

    let server_deps = ServerDeps::new(extractor, Arc::new(PostgresCompanyStore::new(pool)));

    // Build application
    let app = build_app(AppState::new(server_deps), &config.allowed_origins);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);
    tracing::info!("WebSocket endpoint: ws://localhost:{}/ws", config.port);
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .await
        .context("Server error")?;

    Ok(())
}
