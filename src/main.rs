use anyhow::{Context, Result};
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use quiz_challenge_api::{
    config::Config,
    create_app,
    database::{Database, MemoryStore, Store},
    services::{ai_generator::OpenAiGenerator, clock::SystemClock},
    AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;

    if config.ai.api_key.is_empty() {
        warn!("OPENAI_API_KEY is not set; generation requests will fail");
    }

    let store: Arc<dyn Store> = if config.uses_in_memory_store() {
        warn!("Using the in-memory store; nothing will survive a restart");
        Arc::new(MemoryStore::new())
    } else {
        let database = Database::new(&config.database_url)
            .await
            .context("Failed to connect to database")?;
        database.migrate().await.context("Failed to run migrations")?;
        info!("Database ready");
        Arc::new(database)
    };

    let generator = OpenAiGenerator::new(config.ai.clone())
        .context("Failed to build completion client")?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let state = AppState::new(config, store, Arc::new(generator), Arc::new(SystemClock));
    let app = create_app(state);

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
    }
}
