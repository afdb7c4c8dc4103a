// Main entry point for the API server

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use server_core::domains::jobs::{BulkJobWorker, BulkJobWorkerConfig};
use server_core::kernel::{AdminGateway, OpenAiGenerator, ServerDeps};
use server_core::server::build_app;
use server_core::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,server_core=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Copyforge API");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!("Configuration loaded");

    // Connect to database
    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(10)
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

    if config.openai_api_key.is_none() {
        tracing::warn!("OPENAI_API_KEY not set - bulk jobs will fail until it is configured");
    }

    // Wire dependencies
    let generation = Arc::new(OpenAiGenerator::new(
        config.openai_api_key.clone(),
        config.openai_model.clone(),
        config.openai_temperature,
    ));
    let storefront = Arc::new(AdminGateway::new(
        config.storefront_access_token.clone(),
        config.storefront_api_version.clone(),
    ));
    let deps = Arc::new(ServerDeps::new(
        pool,
        storefront,
        generation,
        config.initial_shop_credits,
        Duration::from_millis(config.external_call_timeout_ms),
    ));

    // Start the bulk job worker
    let shutdown = CancellationToken::new();
    let worker = BulkJobWorker::with_config(
        deps.clone(),
        BulkJobWorkerConfig {
            poll_interval: Duration::from_millis(config.worker_poll_interval_ms),
            ..Default::default()
        },
    );
    let worker_handle = tokio::spawn(worker.run(shutdown.clone()));

    // Build application
    let app = build_app(deps);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
        })
        .await
        .context("Server error")?;

    // Stop the worker and wait for any in-flight job to finish its tick
    shutdown.cancel();
    let _ = worker_handle.await;

    Ok(())
}
