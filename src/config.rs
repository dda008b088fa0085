//! Runtime configuration read from the environment.

use crate::error::ConfigError;
use crate::{DB_PATH, DEFAULT_ADDR};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MERMAID_INK_URL: &str = "https://mermaid.ink";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub addr: String,
    /// Without a key every AI call fails and the fallbacks apply.
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: Url,
    pub mermaid_ink_url: Url,
    pub http_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build a config from `lookup`, treating empty values as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let http_timeout = match get("DEVBRAIN_HTTP_TIMEOUT_SECS") {
            Some(value) => value
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| ConfigError::InvalidNumber {
                    var: "DEVBRAIN_HTTP_TIMEOUT_SECS",
                    value,
                })?,
            None => Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        };

        Ok(Self {
            db_path: PathBuf::from(get("DEVBRAIN_DB").unwrap_or_else(|| DB_PATH.to_string())),
            addr: get("DEVBRAIN_ADDR").unwrap_or_else(|| DEFAULT_ADDR.to_string()),
            gemini_api_key: get("GEMINI_API_KEY").or_else(|| get("API_KEY")),
            gemini_model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            gemini_base_url: parse_url(
                "GEMINI_BASE_URL",
                get("GEMINI_BASE_URL").as_deref(),
                DEFAULT_GEMINI_BASE_URL,
            )?,
            mermaid_ink_url: parse_url(
                "MERMAID_INK_URL",
                get("MERMAID_INK_URL").as_deref(),
                DEFAULT_MERMAID_INK_URL,
            )?,
            http_timeout,
        })
    }
}

fn parse_url(var: &'static str, value: Option<&str>, default: &str) -> Result<Url, ConfigError> {
    Url::parse(value.unwrap_or(default)).map_err(|source| ConfigError::InvalidUrl { var, source })
}
