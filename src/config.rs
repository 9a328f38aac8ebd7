//! Configuration for the OpenAPI LLM client
//!
//! Provides the model, credential, and retry settings a client is built from.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{OpenApiLlmError, Result};
use crate::provider::ModelFamily;

/// Default completion budget per model call.
pub const DEFAULT_MAX_TOKENS: u32 = 2048;

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Model identifier; its prefix selects the backend family
    pub model: String,

    /// Credential for the backend
    #[serde(skip_serializing, default)]
    pub api_key: String,

    /// Maximum output tokens per model call
    pub max_tokens: u32,

    /// Sampling temperature, backend default when unset
    pub temperature: Option<f32>,

    /// Override the backend's base URL (proxies, tests)
    pub base_url: Option<String>,

    /// Timeout applied by the HTTP client to each model call
    pub request_timeout: Duration,

    /// Retry configuration
    pub retry: RetryConfig,

    /// Validate incoming payloads against the request schema
    pub validate_request: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            api_key: String::new(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: None,
            base_url: None,
            request_timeout: Duration::from_secs(120),
            retry: RetryConfig::default(),
            validate_request: false,
        }
    }
}

impl ClientConfig {
    /// Configuration for `model` with an explicit key.
    pub fn new(model: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    /// Configuration for `model`, taking the key from the family's usual
    /// environment variable (`OPENAI_API_KEY`, `GOOGLE_API_KEY`, ...).
    pub fn from_env(model: impl Into<String>) -> Result<Self> {
        let model = model.into();
        let family = ModelFamily::from_model_name(&model)?;
        let var = family.api_key_env();
        let api_key = std::env::var(var).map_err(|_| OpenApiLlmError::Config {
            message: format!("environment variable {} is not set", var),
        })?;
        Ok(Self::new(model, api_key))
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_request_validation(mut self, enabled: bool) -> Self {
        self.validate_request = enabled;
        self
    }
}

/// Retry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retries after the first attempt
    pub max_retries: usize,

    /// Delay before the first retry
    pub initial_delay: Duration,

    /// Maximum retry delay
    pub max_delay: Duration,

    /// Exponential backoff multiplier
    pub backoff_multiplier: f32,

    /// Add up to 30% random jitter to each delay
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::ZERO,
            max_delay: Duration::from_secs(10),
            backoff_multiplier: 2.0,
            jitter: false,
        }
    }
}

impl RetryConfig {
    /// No delay between attempts, `max_retries` retries.
    pub fn immediate(max_retries: usize) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }

    /// Exponential backoff starting at `initial_delay`.
    pub fn exponential(max_retries: usize, initial_delay: Duration) -> Self {
        Self {
            max_retries,
            initial_delay,
            jitter: true,
            ..Default::default()
        }
    }
}
