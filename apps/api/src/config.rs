use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::llm_client::DEFAULT_BASE_URL;

const DEFAULT_STAGE_TIMEOUT_SECS: u64 = 90;

/// Application configuration loaded from environment variables.
///
/// The backend credential is optional: without it every stage and the chat
/// assistant run in mock mode instead of failing startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: Option<String>,
    pub gemini_base_url: String,
    pub port: u16,
    pub rust_log: String,
    pub stage_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let gemini_api_key = non_blank(std::env::var("GEMINI_API_KEY").ok())
            .or_else(|| non_blank(std::env::var("API_KEY").ok()));

        Ok(Config {
            gemini_api_key,
            gemini_base_url: non_blank(std::env::var("GEMINI_BASE_URL").ok())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            stage_timeout: parse_stage_timeout(std::env::var("STAGE_TIMEOUT_SECS").ok())?,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            gemini_base_url: DEFAULT_BASE_URL.to_string(),
            port: 8080,
            rust_log: "info".to_string(),
            stage_timeout: Duration::from_secs(DEFAULT_STAGE_TIMEOUT_SECS),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_stage_timeout(raw: Option<String>) -> Result<Duration> {
    let Some(raw) = non_blank(raw) else {
        return Ok(Duration::from_secs(DEFAULT_STAGE_TIMEOUT_SECS));
    };
    let secs = raw
        .parse::<u64>()
        .context("STAGE_TIMEOUT_SECS must be a whole number of seconds")?;
    if secs == 0 {
        bail!("STAGE_TIMEOUT_SECS must be greater than zero");
    }
    Ok(Duration::from_secs(secs))
}
