//! Model client configuration

use serde::Deserialize;

pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// Settings for the remote chat model
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Model identifier
    pub model: String,
    /// Base URL of an OpenAI-compatible API (without `/v1`)
    pub base_url: String,
    /// Bearer token for the API
    pub api_key: Option<String>,
    /// Sampling temperature, deterministic by default
    pub temperature: f32,
    /// HTTP request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            temperature: 0.0,
            timeout_secs: 300,
        }
    }
}

impl ModelConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Override fields from environment variables.
    ///
    /// Reads `YANGMEI_MODEL`, `OPENAI_BASE_URL` and `OPENAI_API_KEY` through
    /// `lookup`, so callers decide where values come from.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(model) = lookup("YANGMEI_MODEL").filter(|v| !v.is_empty()) {
            self.model = model;
        }
        if let Some(url) = lookup("OPENAI_BASE_URL").filter(|v| !v.is_empty()) {
            self.base_url = url;
        }
        if let Some(key) = lookup("OPENAI_API_KEY").filter(|v| !v.is_empty()) {
            self.api_key = Some(key);
        }
    }

    /// Chat completions endpoint
    pub fn chat_url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

impl std::fmt::Debug for ModelConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelConfig")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("temperature", &self.temperature)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}
