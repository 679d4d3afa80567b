use anyhow::{Context, Result};

use crate::llm_client::DEFAULT_MODEL;

const DEFAULT_DATASET_PATH: &str = "data/MEN_MATRICULA_ESTADISTICA_ES_20250916.csv";
const DEFAULT_PORT: u16 = 5000;
const DEFAULT_MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;
const DEFAULT_DRAFT_TTL_SECS: u64 = 60 * 60;

/// Application configuration loaded from environment variables.
/// Every variable has a default; only malformed values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub dataset_path: String,
    pub port: u16,
    pub rust_log: String,
    /// Unset disables text generation.
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub max_image_bytes: usize,
    /// Drafts idle for longer than this are discarded.
    pub draft_ttl_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. `from_env` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Config {
            dataset_path: get("DATASET_PATH").unwrap_or_else(|| DEFAULT_DATASET_PATH.to_string()),
            port: get("PORT")
                .map(|v| v.parse::<u16>())
                .transpose()
                .context("PORT must be a valid port number")?
                .unwrap_or(DEFAULT_PORT),
            rust_log: get("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            gemini_api_key: get("GEMINI_API_KEY"),
            gemini_model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            max_image_bytes: get("MAX_IMAGE_BYTES")
                .map(|v| v.parse::<usize>())
                .transpose()
                .context("MAX_IMAGE_BYTES must be a byte count")?
                .unwrap_or(DEFAULT_MAX_IMAGE_BYTES),
            draft_ttl_secs: get("DRAFT_TTL_SECS")
                .map(|v| v.parse::<u64>())
                .transpose()
                .context("DRAFT_TTL_SECS must be a number of seconds")?
                .unwrap_or(DEFAULT_DRAFT_TTL_SECS),
        })
    }
}
