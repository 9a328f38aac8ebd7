//! Error types for the OpenAPI LLM client

use thiserror::Error;

use crate::validate::SchemaKind;

/// Result type alias for the crate
pub type Result<T> = std::result::Result<T, OpenApiLlmError>;

/// How the request orchestrator treats an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Fixed misconfiguration; surfaced immediately, never retried.
    Configuration,
    /// Possibly recoverable model mistake or backend hiccup; retried.
    Transient,
}

/// Main error type for the OpenAPI LLM client
#[derive(Debug, Error)]
pub enum OpenApiLlmError {
    /// Model name does not match any backend family prefix
    #[error("Unsupported model: {model}")]
    UnsupportedModel { model: String },

    /// The document has no entry for this path/method pair
    #[error("Operation not found: {method} {path}")]
    OperationNotFound { path: String, method: String },

    /// The operation declares no schema of the requested kind
    #[error("No {kind} schema for {method} {path}")]
    SchemaNotFound {
        kind: SchemaKind,
        path: String,
        method: String,
    },

    /// A schema taken from the document could not be compiled
    #[error("Invalid {kind} schema: {message}")]
    InvalidSchema { kind: SchemaKind, message: String },

    /// The OpenAPI document could not be loaded or dereferenced
    #[error("Document error: {message}")]
    Document { message: String },

    /// Incoming payload rejected by the request schema
    #[error("Request payload does not match schema: {}", errors.join("; "))]
    InvalidRequest { errors: Vec<String> },

    /// Invalid client configuration
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Error from an OpenAI-compatible API
    #[error("OpenAI API error: {0}")]
    OpenAI(#[from] async_openai::error::OpenAIError),

    /// Transport error talking to a REST backend
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered, but not with something we understand
    #[error("Provider error ({provider}): {message}")]
    Provider {
        provider: &'static str,
        message: String,
    },

    /// Backend returned no text
    #[error("Model returned an empty completion")]
    EmptyCompletion,

    /// Model text (or text payload) is not JSON
    #[error("Invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// Model output rejected by the response schema
    #[error("{kind} validation failed: {}", errors.join("; "))]
    Validation {
        kind: SchemaKind,
        errors: Vec<String>,
    },

    /// A registered hook failed
    #[error("Hook error: {message}")]
    Hook { message: String },

    /// The system prompt could not be rendered
    #[error("Prompt error: {message}")]
    Prompt { message: String },
}

impl OpenApiLlmError {
    /// Classify this error for the retry loop.
    pub fn class(&self) -> ErrorClass {
        match self {
            OpenApiLlmError::UnsupportedModel { .. }
            | OpenApiLlmError::OperationNotFound { .. }
            | OpenApiLlmError::SchemaNotFound { .. }
            | OpenApiLlmError::InvalidSchema { .. }
            | OpenApiLlmError::Document { .. }
            | OpenApiLlmError::InvalidRequest { .. }
            | OpenApiLlmError::Config { .. } => ErrorClass::Configuration,
            OpenApiLlmError::OpenAI(_)
            | OpenApiLlmError::Http(_)
            | OpenApiLlmError::Provider { .. }
            | OpenApiLlmError::EmptyCompletion
            | OpenApiLlmError::InvalidJson(_)
            | OpenApiLlmError::Validation { .. }
            | OpenApiLlmError::Hook { .. }
            | OpenApiLlmError::Prompt { .. } => ErrorClass::Transient,
        }
    }

    /// Shorthand for `self.class() == ErrorClass::Transient`.
    pub fn is_transient(&self) -> bool {
        self.class() == ErrorClass::Transient
    }

    pub(crate) fn hook(err: impl std::fmt::Display) -> Self {
        OpenApiLlmError::Hook {
            message: err.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for OpenApiLlmError {
    fn from(err: serde_yaml::Error) -> Self {
        OpenApiLlmError::Document {
            message: err.to_string(),
        }
    }
}
