use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_temperature: f32,
    pub storefront_access_token: Option<String>,
    pub storefront_api_version: String,
    pub initial_shop_credits: i64,
    pub worker_poll_interval_ms: u64,
    pub external_call_timeout_ms: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let raw_temperature = env::var("OPENAI_TEMPERATURE")
            .ok()
            .and_then(|v| v.parse::<f32>().ok())
            .unwrap_or(0.25);

        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .context("DATABASE_URL must be set")?,
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            openai_api_key: env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty()),
            openai_model: env::var("OPENAI_MODEL")
                .unwrap_or_else(|_| "gpt-4.1-mini".to_string()),
            openai_temperature: raw_temperature.clamp(0.0, 1.0),
            storefront_access_token: env::var("STOREFRONT_ACCESS_TOKEN")
                .ok()
                .filter(|t| !t.is_empty()),
            storefront_api_version: env::var("STOREFRONT_API_VERSION")
                .unwrap_or_else(|_| "2024-10".to_string()),
            initial_shop_credits: env::var("INITIAL_SHOP_CREDITS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1000),
            worker_poll_interval_ms: env::var("WORKER_POLL_INTERVAL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5000),
            external_call_timeout_ms: env::var("EXTERNAL_CALL_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60_000),
        })
    }
}
