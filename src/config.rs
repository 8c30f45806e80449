//! Assistant configuration: YAML file, environment overrides, API key lookup.

use keyring::Entry;
use serde::{Deserialize, Serialize};
use std::env;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::resilience::RetryPolicy;
use crate::{Error, ErrorContext, Result};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-004";

const KEYRING_SERVICE: &str = "supplychain-assistant";
const KEYRING_USER: &str = "gemini";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            delay_ms: 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    pub model: String,
    pub embedding_model: String,
    pub base_url: String,
    /// Inline key; prefer the keyring or `GEMINI_API_KEY`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub temperature: f64,
    pub max_output_tokens: u32,
    pub cache_capacity: usize,
    pub retrieval_top_k: usize,
    pub timeout_secs: u64,
    pub retry: RetryConfig,
    pub data_path: Option<PathBuf>,
    pub documents_dir: Option<PathBuf>,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            temperature: 0.2,
            max_output_tokens: 1024,
            cache_capacity: 128,
            retrieval_top_k: 3,
            timeout_secs: 30,
            retry: RetryConfig::default(),
            data_path: None,
            documents_dir: None,
        }
    }
}

impl AssistantConfig {
    /// Load a YAML config file, then apply environment overrides and validate.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::configuration_with_context(
                format!("cannot read config file: {}", e),
                ErrorContext::new()
                    .with_details(path.display().to_string())
                    .with_source("config"),
            )
        })?;
        let config: Self = serde_yaml::from_str(&text)?;
        let config = config.with_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Defaults plus environment overrides.
    pub fn from_env() -> Result<Self> {
        let config = Self::default().with_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply `SCA_*` environment variables on top of this config.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|name| env::var(name).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(v) = lookup("SCA_MODEL") {
            self.model = v;
        }
        if let Some(v) = lookup("SCA_EMBEDDING_MODEL") {
            self.embedding_model = v;
        }
        if let Some(v) = lookup("SCA_BASE_URL") {
            self.base_url = v;
        }
        if let Some(v) = lookup("SCA_CACHE_CAPACITY").and_then(|s| s.parse().ok()) {
            self.cache_capacity = v;
        }
        if let Some(v) = lookup("SCA_TIMEOUT_SECS").and_then(|s| s.parse().ok()) {
            self.timeout_secs = v;
        }
        if let Some(v) = lookup("SCA_DATA_PATH") {
            self.data_path = Some(PathBuf::from(v));
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(field_error("model must not be empty", "model"));
        }
        if self.embedding_model.trim().is_empty() {
            return Err(field_error(
                "embedding_model must not be empty",
                "embedding_model",
            ));
        }
        if self.cache_capacity == 0 {
            return Err(field_error(
                "cache_capacity must be at least 1",
                "cache_capacity",
            ));
        }
        if self.retrieval_top_k == 0 {
            return Err(field_error(
                "retrieval_top_k must be at least 1",
                "retrieval_top_k",
            ));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(field_error(
                "temperature must be within 0.0..=2.0",
                "temperature",
            ));
        }
        url::Url::parse(&self.base_url).map_err(|e| {
            Error::configuration_with_context(
                format!("invalid base_url: {}", e),
                ErrorContext::new()
                    .with_field_path("base_url")
                    .with_details(self.base_url.clone()),
            )
        })?;
        Ok(())
    }

    pub fn cache_capacity(&self) -> Result<NonZeroUsize> {
        NonZeroUsize::new(self.cache_capacity)
            .ok_or_else(|| field_error("cache_capacity must be at least 1", "cache_capacity"))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry.max_attempts,
            Duration::from_millis(self.retry.delay_ms),
        )
    }

    /// Resolve the API key: config, then OS keyring, then `GEMINI_API_KEY` / `GOOGLE_API_KEY`.
    pub fn resolve_api_key(&self) -> Option<String> {
        if let Some(key) = self.api_key.as_ref().filter(|k| !k.is_empty()) {
            return Some(key.clone());
        }
        if let Ok(entry) = Entry::new(KEYRING_SERVICE, KEYRING_USER) {
            if let Ok(key) = entry.get_password() {
                return Some(key);
            }
        }
        env::var("GEMINI_API_KEY")
            .or_else(|_| env::var("GOOGLE_API_KEY"))
            .ok()
            .filter(|k| !k.is_empty())
    }
}

fn field_error(msg: &str, field: &str) -> Error {
    Error::configuration_with_context(
        msg,
        ErrorContext::new()
            .with_field_path(field)
            .with_source("config"),
    )
}
