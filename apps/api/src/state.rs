use std::sync::Arc;

use crate::composer::DraftStore;
use crate::config::Config;
use crate::dataset::Dataset;
use crate::llm_client::TextGenerator;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Loaded once at startup; read-only afterwards.
    pub dataset: Arc<Dataset>,
    pub drafts: DraftStore,
    /// Gemini backend, or `DisabledGenerator` when no API key is configured.
    pub text_generator: Arc<dyn TextGenerator>,
    pub config: Config,
}
