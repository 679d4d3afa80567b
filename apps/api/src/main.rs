mod composer;
mod config;
mod dataset;
mod errors;
mod layout;
mod llm_client;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::composer::DraftStore;
use crate::config::Config;
use crate::dataset::Dataset;
use crate::llm_client::{DisabledGenerator, LlmClient, TextGenerator};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed values)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Aula API v{}", env!("CARGO_PKG_VERSION"));

    // Load the enrollment dataset; the service cannot run without it
    let dataset = Dataset::load(&config.dataset_path)
        .await
        .with_context(|| format!("Failed to load dataset from '{}'", config.dataset_path))?;

    // Initialize text generation (disabled without an API key)
    let text_generator: Arc<dyn TextGenerator> = match &config.gemini_api_key {
        Some(key) => {
            let llm = LlmClient::new(key.clone(), config.gemini_model.clone())
                .context("Failed to build HTTP client for text generation")?;
            info!("LLM client initialized (model: {})", llm.model());
            Arc::new(llm)
        }
        None => {
            warn!("GEMINI_API_KEY is not set; text generation is disabled");
            Arc::new(DisabledGenerator)
        }
    };

    // Build app state
    let state = AppState {
        dataset: Arc::new(dataset),
        drafts: DraftStore::new(Duration::from_secs(config.draft_ttl_secs)),
        text_generator,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
