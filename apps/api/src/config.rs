use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::llm_client::DEFAULT_API_BASE;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub gemini_api_base: String,
    pub storage: Storage,
    pub port: u16,
    pub rust_log: String,
}

/// Where documents are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Storage {
    Redis(String),
    Files(PathBuf),
    /// Nothing survives a restart.
    Memory,
}

impl Storage {
    /// `REDIS_URL` wins over `DATA_DIR`; with neither set documents stay in memory.
    fn select(redis_url: Option<String>, data_dir: Option<String>) -> Self {
        match (redis_url, data_dir) {
            (Some(url), _) => Storage::Redis(url),
            (None, Some(dir)) => Storage::Files(PathBuf::from(dir)),
            (None, None) => Storage::Memory,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            gemini_api_key: require_env("GEMINI_API_KEY")?,
            gemini_api_base: optional_env("GEMINI_API_BASE")
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            storage: Storage::select(optional_env("REDIS_URL"), optional_env("DATA_DIR")),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Unset and blank are treated the same.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_selection() {
        assert_eq!(
            Storage::select(Some("redis://localhost".to_string()), Some("./data".to_string())),
            Storage::Redis("redis://localhost".to_string())
        );
        assert_eq!(
            Storage::select(None, Some("./data".to_string())),
            Storage::Files(PathBuf::from("./data"))
        );
        assert_eq!(Storage::select(None, None), Storage::Memory);
    }
}
