use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

/// Runtime configuration, environment-driven with CLI overrides.
///
/// Everything has a workable default except the generation API key: without
/// one, tier 3 of the interaction fallback (and the generated-extraction
/// fallback) is disabled rather than failing searches outright.
#[derive(Debug, Clone)]
pub struct Config {
    /// Bearer key for the chat-completions endpoint (`LENSPROBE_API_KEY`)
    pub api_key: Option<String>,
    /// Base URL of an OpenAI-compatible API (`LENSPROBE_API_BASE`)
    pub api_base: String,
    /// Model identifier for script generation (`LENSPROBE_MODEL`)
    pub model: String,
    /// Alert webhook, Slack-style (`LENSPROBE_WEBHOOK_URL`)
    pub webhook_url: Option<String>,
    /// Directory holding the two persisted stores (`LENSPROBE_DATA_DIR`)
    pub data_dir: PathBuf,
    /// WebDriver endpoint to connect to (`LENSPROBE_WEBDRIVER_URL`)
    pub webdriver_url: String,
    /// Base URL of the lens-style search engine (`LENSPROBE_LENS_BASE`)
    pub lens_base: String,
    /// Run the browser headless
    pub headless: bool,
    /// Aggregate deadline for one whole search
    pub search_deadline: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("LENSPROBE_API_KEY").ok().filter(|k| !k.is_empty());
        if api_key.is_none() {
            warn!("LENSPROBE_API_KEY not set; script generation tier is disabled");
        }

        let data_dir = match std::env::var("LENSPROBE_DATA_DIR") {
            Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => dirs::home_dir()
                .context("Unable to determine home directory")?
                .join(".lensprobe"),
        };

        Ok(Config {
            api_key,
            api_base: env_or("LENSPROBE_API_BASE", "https://api.openai.com/v1"),
            model: env_or("LENSPROBE_MODEL", "gpt-4o"),
            webhook_url: std::env::var("LENSPROBE_WEBHOOK_URL").ok().filter(|u| !u.is_empty()),
            data_dir,
            webdriver_url: env_or("LENSPROBE_WEBDRIVER_URL", "http://localhost:4444"),
            lens_base: env_or("LENSPROBE_LENS_BASE", "https://lens.google.com"),
            headless: true,
            search_deadline: Duration::from_secs(180),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    match std::env::var(key) {
        Ok(value) if !value.is_empty() => value,
        _ => default.to_string(),
    }
}
