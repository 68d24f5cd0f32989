//! Backend credentials and model selection.

use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Errors raised while loading configuration. Fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    #[error("{name} must be {expected}, got '{value}'")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    /// Base URL without trailing slash.
    pub api_base: String,
    /// Model for text and structured replies.
    pub text_model: String,
    /// Model for image replies.
    pub image_model: String,
    /// Per-request HTTP timeout.
    pub timeout: Duration,
}

impl GeminiConfig {
    /// Defaults for everything but the key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// | Env Var               | Default                                            |
    /// |-----------------------|----------------------------------------------------|
    /// | `GEMINI_API_KEY`      | required                                           |
    /// | `GEMINI_API_BASE`     | `https://generativelanguage.googleapis.com/v1beta` |
    /// | `GEMINI_TEXT_MODEL`   | `gemini-2.5-flash`                                 |
    /// | `GEMINI_IMAGE_MODEL`  | `gemini-2.5-flash-image`                           |
    /// | `GEMINI_TIMEOUT_SECS` | `120`                                              |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let api_key = non_empty("GEMINI_API_KEY").ok_or(ConfigError::Missing("GEMINI_API_KEY"))?;
        let mut config = Self::new(api_key);

        if let Some(base) = non_empty("GEMINI_API_BASE") {
            config.api_base = base.trim_end_matches('/').to_string();
        }
        if let Some(model) = non_empty("GEMINI_TEXT_MODEL") {
            config.text_model = model;
        }
        if let Some(model) = non_empty("GEMINI_IMAGE_MODEL") {
            config.image_model = model;
        }
        if let Some(raw) = non_empty("GEMINI_TIMEOUT_SECS") {
            let secs = raw
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| ConfigError::Invalid {
                    name: "GEMINI_TIMEOUT_SECS",
                    expected: "a positive number of seconds",
                    value: raw.clone(),
                })?;
            config.timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }
}
