//! # openapi-llm
//!
//! Serve OpenAPI operations from a language model.
//!
//! Given an OpenAPI document, a path and a method, the client slices the
//! document down to that one operation, asks a model to act as the server,
//! and returns JSON that validates against the operation's 200 response
//! schema. Every declared property is present in the result, even when the
//! model left it out.
//!
//! ## Pipeline
//!
//! - **Slice**: keep only the requested operation plus `info` and `components`
//! - **Prompt**: fixed policy text followed by the slice
//! - **Model**: OpenAI, Google, Mistral, or Anthropic, chosen by model-name prefix
//! - **Normalize**: strip code fences and inline backticks
//! - **Validate**: check the parsed value against the response schema
//! - **Reconcile**: merge the value over a blank instance of the schema
//!
//! Transient failures (provider errors, bad JSON, schema violations) are
//! retried up to three times. Configuration errors are returned at once.
//!
//! ## Getting Started
//!
//! Set `OPENAI_API_KEY` (or the key variable of the family you use).
//!
//! ```rust,no_run
//! use openapi_llm::{ClientConfig, OpenApiDocument, OpenApiLlm};
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//! let yaml = std::fs::read_to_string("demos/hello_world.yaml")?;
//! let document = OpenApiDocument::from_yaml_str(&yaml)?;
//! let llm = OpenApiLlm::new(document, ClientConfig::from_env("gpt-4o-mini")?)?;
//!
//! let greeting = llm
//!     .call_operation("/hello-world", "post", json!({"text": "Paul", "language": "es"}))
//!     .await?;
//! println!("{}", greeting["text"]);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod document;
pub mod error;
pub mod hooks;
pub mod normalize;
pub mod payload;
pub mod prompt;
pub mod provider;
pub mod reconcile;
pub mod retry;
pub mod service;
pub mod slice;
pub mod validate;

pub use client::{AttemptContext, OpenApiLlm, OpenApiLlmBuilder, Stage, StageError};
pub use config::{ClientConfig, RetryConfig, DEFAULT_MAX_TOKENS};
pub use document::OpenApiDocument;
pub use error::{ErrorClass, OpenApiLlmError, Result};
pub use hooks::{HookSet, PostResponseHook, PrePromptHook};
pub use normalize::normalize;
pub use payload::RequestPayload;
pub use prompt::{build_system_prompt, PromptTemplate, SYSTEM_INSTRUCTIONS};
pub use provider::{ModelFamily, ModelGateway, ModelProvider, RecordedCall, ScriptedModel};
pub use reconcile::{blank, merge, reconcile};
pub use retry::{IdentitySimplifier, PayloadSimplifier, RetryPolicy};
pub use service::OperationRequest;
pub use slice::{slice, OperationSlice};
pub use validate::{schema_for, validate, validate_schema, SchemaKind};
