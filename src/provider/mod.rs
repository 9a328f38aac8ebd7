//! Model gateway: one uniform "system + user in, text out" capability over
//! several interchangeable backends.
//!
//! The backend is picked from the model name by prefix:
//!
//! | prefix    | family                 | JSON mode |
//! |-----------|------------------------|-----------|
//! | `gpt`     | [`ModelFamily::OpenAI`]    | requested |
//! | `gemini`  | [`ModelFamily::Google`]    | -         |
//! | `mistral` | [`ModelFamily::Mistral`]   | -         |
//! | `claude`  | [`ModelFamily::Anthropic`] | -         |
//!
//! JSON mode is a hint to the backend only; callers still normalize and
//! validate whatever text comes back.
//!
//! For tests and demos, [`ScriptedModel`] plays back queued replies.

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::config::ClientConfig;
use crate::error::{OpenApiLlmError, Result};

pub mod anthropic;
pub mod google;
pub mod openai;

pub use anthropic::AnthropicChat;
pub use google::GeminiChat;
pub use openai::OpenAIChat;

/// Trait for model providers
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Send one system instruction and one user turn, return the reply text.
    async fn complete(&self, system: &str, user: &str) -> Result<String>;

    /// Get the model name
    fn model_name(&self) -> &str;
}

/// Backend families, selected by model-name prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFamily {
    OpenAI,
    Google,
    Mistral,
    Anthropic,
}

const PREFIXES: &[(&str, ModelFamily)] = &[
    ("gpt", ModelFamily::OpenAI),
    ("gemini", ModelFamily::Google),
    ("mistral", ModelFamily::Mistral),
    ("claude", ModelFamily::Anthropic),
];

impl ModelFamily {
    /// Case-sensitive prefix match over the family table.
    pub fn from_model_name(model: &str) -> Result<Self> {
        PREFIXES
            .iter()
            .find(|(prefix, _)| model.starts_with(prefix))
            .map(|(_, family)| *family)
            .ok_or_else(|| OpenApiLlmError::UnsupportedModel {
                model: model.to_string(),
            })
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            ModelFamily::OpenAI => "https://api.openai.com/v1",
            ModelFamily::Google => "https://generativelanguage.googleapis.com/v1beta",
            ModelFamily::Mistral => "https://api.mistral.ai/v1",
            ModelFamily::Anthropic => "https://api.anthropic.com/v1",
        }
    }

    /// Environment variable conventionally holding this family's key.
    pub fn api_key_env(&self) -> &'static str {
        match self {
            ModelFamily::OpenAI => "OPENAI_API_KEY",
            ModelFamily::Google => "GOOGLE_API_KEY",
            ModelFamily::Mistral => "MISTRAL_API_KEY",
            ModelFamily::Anthropic => "ANTHROPIC_API_KEY",
        }
    }

    /// Whether this family is asked for JSON-object output.
    pub fn requests_json_mode(&self) -> bool {
        matches!(self, ModelFamily::OpenAI)
    }
}

impl fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModelFamily::OpenAI => "openai",
            ModelFamily::Google => "google",
            ModelFamily::Mistral => "mistral",
            ModelFamily::Anthropic => "anthropic",
        };
        f.write_str(name)
    }
}

/// A configured backend of one of the supported families.
pub enum ModelGateway {
    OpenAI(OpenAIChat),
    Google(GeminiChat),
    Mistral(OpenAIChat),
    Anthropic(AnthropicChat),
}

impl ModelGateway {
    /// Build the backend for `config.model`; unknown prefixes fail here.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let family = ModelFamily::from_model_name(&config.model)?;
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| family.default_base_url().to_string());
        let gateway = match family {
            ModelFamily::OpenAI => ModelGateway::OpenAI(OpenAIChat::new(
                config,
                &base_url,
                family.requests_json_mode(),
            )?),
            ModelFamily::Mistral => ModelGateway::Mistral(OpenAIChat::new(
                config,
                &base_url,
                family.requests_json_mode(),
            )?),
            ModelFamily::Google => ModelGateway::Google(GeminiChat::new(config, &base_url)?),
            ModelFamily::Anthropic => {
                ModelGateway::Anthropic(AnthropicChat::new(config, &base_url)?)
            }
        };
        Ok(gateway)
    }

    pub fn family(&self) -> ModelFamily {
        match self {
            ModelGateway::OpenAI(_) => ModelFamily::OpenAI,
            ModelGateway::Google(_) => ModelFamily::Google,
            ModelGateway::Mistral(_) => ModelFamily::Mistral,
            ModelGateway::Anthropic(_) => ModelFamily::Anthropic,
        }
    }
}

#[async_trait]
impl ModelProvider for ModelGateway {
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        match self {
            ModelGateway::OpenAI(m) | ModelGateway::Mistral(m) => m.complete(system, user).await,
            ModelGateway::Google(m) => m.complete(system, user).await,
            ModelGateway::Anthropic(m) => m.complete(system, user).await,
        }
    }

    fn model_name(&self) -> &str {
        match self {
            ModelGateway::OpenAI(m) | ModelGateway::Mistral(m) => m.model_name(),
            ModelGateway::Google(m) => m.model_name(),
            ModelGateway::Anthropic(m) => m.model_name(),
        }
    }
}

pub(crate) fn http_client(config: &ClientConfig) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(config.request_timeout)
        .build()
        .map_err(|e| OpenApiLlmError::Config {
            message: format!("failed to create HTTP client: {}", e),
        })
}

/// Reject empty completions so they count as a failed attempt.
pub(crate) fn non_empty(text: Option<String>) -> Result<String> {
    match text {
        Some(t) if !t.trim().is_empty() => Ok(t),
        _ => Err(OpenApiLlmError::EmptyCompletion),
    }
}

/// One recorded call to a [`ScriptedModel`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub system: String,
    pub user: String,
}

#[derive(Debug, Clone)]
enum Scripted {
    Reply(String),
    Fail(String),
}

/// Model provider that plays back a script, for tests and demos.
pub struct ScriptedModel {
    name: String,
    script: Mutex<VecDeque<Scripted>>,
    fallback: Option<Scripted>,
    calls: AtomicUsize,
    recorded: Mutex<Vec<RecordedCall>>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self {
            name: "scripted".to_string(),
            script: Mutex::new(VecDeque::new()),
            fallback: None,
            calls: AtomicUsize::new(0),
            recorded: Mutex::new(Vec::new()),
        }
    }

    /// A model that answers every call with `reply`.
    pub fn always(reply: impl Into<String>) -> Self {
        let mut model = Self::new();
        model.fallback = Some(Scripted::Reply(reply.into()));
        model
    }

    /// A model that fails every call with `message`.
    pub fn always_failing(message: impl Into<String>) -> Self {
        let mut model = Self::new();
        model.fallback = Some(Scripted::Fail(message.into()));
        model
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Queue a reply.
    pub fn with_reply(self, reply: impl Into<String>) -> Self {
        self.push(Scripted::Reply(reply.into()));
        self
    }

    /// Queue a backend failure.
    pub fn with_failure(self, message: impl Into<String>) -> Self {
        self.push(Scripted::Fail(message.into()));
        self
    }

    fn push(&self, item: Scripted) {
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(item);
    }

    /// Number of calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every call made so far, in order.
    pub fn recorded(&self) -> Vec<RecordedCall> {
        self.recorded
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl Default for ScriptedModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ModelProvider for ScriptedModel {
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.recorded
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(RecordedCall {
                system: system.to_string(),
                user: user.to_string(),
            });

        let next = self
            .script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .or_else(|| self.fallback.clone());

        match next {
            Some(Scripted::Reply(text)) => Ok(text),
            Some(Scripted::Fail(message)) => Err(OpenApiLlmError::Provider {
                provider: "scripted",
                message,
            }),
            None => Err(OpenApiLlmError::Provider {
                provider: "scripted",
                message: "script exhausted".to_string(),
            }),
        }
    }

    fn model_name(&self) -> &str {
        &self.name
    }
}
