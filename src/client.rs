//! Request orchestration: the per-operation pipeline and its retry loop.
//!
//! One logical request runs as a sequence of attempts. Each attempt walks the
//! stages below; any transient failure starts a new attempt with a fresh
//! [`AttemptContext`] until the retry budget is spent.
//!
//! ```text
//! PromptBuild -> ModelCall -> Normalize -> Validate -> Reconcile -> done
//!      ^                                                    |
//!      +------------- transient error, budget left ---------+
//! ```
//!
//! Configuration errors (unknown operation, missing schema, ...) end the
//! request immediately. When the budget is exhausted the last error is
//! returned unchanged.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tokio::time::sleep;
use tower::BoxError;
use tracing::{debug, info_span, warn, Instrument};

use crate::config::{ClientConfig, RetryConfig};
use crate::document::OpenApiDocument;
use crate::error::{OpenApiLlmError, Result};
use crate::hooks::{HookRegistry, HookSet, PostResponseHook, PrePromptHook};
use crate::normalize::normalize;
use crate::payload::RequestPayload;
use crate::prompt::build_system_prompt;
use crate::provider::{ModelGateway, ModelProvider};
use crate::reconcile::reconcile;
use crate::retry::{is_retryable, IdentitySimplifier, PayloadSimplifier, RetryPolicy, SharedSimplifier};
use crate::slice::slice;
use crate::validate::{schema_for, validate_schema, SchemaKind};

/// Stage of an attempt that can fail. Reconciliation is infallible and has
/// no variant; JSON parse failures count as `Validate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    PromptBuild,
    ModelCall,
    Normalize,
    Validate,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::PromptBuild => "prompt_build",
            Stage::ModelCall => "model_call",
            Stage::Normalize => "normalize",
            Stage::Validate => "validate",
        };
        f.write_str(name)
    }
}

/// An attempt failure tagged with the stage it happened in.
#[derive(Debug)]
pub struct StageError {
    pub stage: Stage,
    pub error: OpenApiLlmError,
}

impl StageError {
    fn at(stage: Stage) -> impl FnOnce(OpenApiLlmError) -> StageError {
        move |error| StageError { stage, error }
    }
}

impl fmt::Display for StageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.stage, self.error)
    }
}

impl std::error::Error for StageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Immutable input of one attempt. A retry builds a new context.
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptContext {
    pub path: String,
    pub method: String,
    pub payload: RequestPayload,
    /// 0 for the first attempt
    pub attempt: usize,
}

impl AttemptContext {
    pub fn new(path: impl Into<String>, method: impl Into<String>, payload: RequestPayload) -> Self {
        Self {
            path: path.into(),
            method: method.into(),
            payload,
            attempt: 0,
        }
    }

    /// Context for the next attempt of the same request.
    pub fn retry(&self, payload: RequestPayload) -> Self {
        Self {
            path: self.path.clone(),
            method: self.method.clone(),
            payload,
            attempt: self.attempt + 1,
        }
    }
}

struct Inner {
    document: Arc<OpenApiDocument>,
    model: Arc<dyn ModelProvider>,
    hooks: HookRegistry,
    retry: RetryConfig,
    simplifier: SharedSimplifier,
    validate_request: bool,
}

/// Serves OpenAPI operations from a language model.
///
/// Cheap to clone; clones share the document, model, and hooks.
#[derive(Clone)]
pub struct OpenApiLlm {
    inner: Arc<Inner>,
}

impl OpenApiLlm {
    pub fn builder(document: OpenApiDocument) -> OpenApiLlmBuilder {
        OpenApiLlmBuilder::new(document)
    }

    /// Client for `config.model`, using the matching backend family.
    pub fn new(document: OpenApiDocument, config: ClientConfig) -> Result<Self> {
        Self::builder(document).config(config).build()
    }

    pub fn document(&self) -> &OpenApiDocument {
        &self.inner.document
    }

    pub fn model_name(&self) -> &str {
        self.inner.model.model_name()
    }

    /// Replace the pre-prompt hook.
    pub fn set_pre_prompt_hook<F>(&self, hook: F)
    where
        F: Fn(RequestPayload) -> std::result::Result<RequestPayload, BoxError>
            + Send
            + Sync
            + 'static,
    {
        self.inner.hooks.set_pre_prompt(Some(Arc::new(hook)));
    }

    pub fn clear_pre_prompt_hook(&self) {
        self.inner.hooks.set_pre_prompt(None);
    }

    /// Replace the post-response hook.
    pub fn set_post_response_hook<F>(&self, hook: F)
    where
        F: Fn(String) -> std::result::Result<String, BoxError> + Send + Sync + 'static,
    {
        self.inner.hooks.set_post_response(Some(Arc::new(hook)));
    }

    pub fn clear_post_response_hook(&self) {
        self.inner.hooks.set_post_response(None);
    }

    /// Run one operation and return a value shaped like its 200 response.
    pub async fn call_operation(
        &self,
        path: &str,
        method: &str,
        payload: impl Into<RequestPayload>,
    ) -> Result<Value> {
        let ctx = AttemptContext::new(path, method, payload.into());
        let span = info_span!("openapi_llm.call", path = %path, method = %method);
        self.run(ctx).instrument(span).await
    }

    async fn run(&self, mut ctx: AttemptContext) -> Result<Value> {
        let hooks = self.inner.hooks.snapshot();
        let mut policy = RetryPolicy::new(self.inner.retry.clone());

        loop {
            debug!(attempt = ctx.attempt, "attempt started");
            let StageError { stage, error } = match self.attempt(&ctx, &hooks).await {
                Ok(value) => {
                    debug!(attempts = ctx.attempt + 1, "operation completed");
                    return Ok(value);
                }
                Err(failure) => failure,
            };

            if !is_retryable(&error) {
                warn!(%stage, error = %error, "non-retryable error");
                return Err(error);
            }

            if !policy.should_retry() {
                warn!(
                    %stage,
                    attempts = ctx.attempt + 1,
                    error = %error,
                    "retry budget exhausted"
                );
                return Err(error);
            }

            let delay = policy.next_delay();
            warn!(
                %stage,
                attempt = ctx.attempt,
                error = %error,
                ?delay,
                "attempt failed, retrying"
            );
            let payload = self.inner.simplifier.simplify(&ctx.payload, ctx.attempt, &error);
            ctx = ctx.retry(payload);
            if !delay.is_zero() {
                sleep(delay).await;
            }
        }
    }

    /// Run a single attempt with the given hooks, without retrying.
    pub async fn attempt(
        &self,
        ctx: &AttemptContext,
        hooks: &HookSet,
    ) -> std::result::Result<Value, StageError> {
        let (system, user, response_schema) = self
            .prepare(ctx, hooks)
            .map_err(StageError::at(Stage::PromptBuild))?;

        let raw = self
            .inner
            .model
            .complete(&system, &user)
            .await
            .map_err(StageError::at(Stage::ModelCall))?;

        let text = hooks
            .apply_post_response(normalize(&raw))
            .map_err(StageError::at(Stage::Normalize))?;

        let value: Value = serde_json::from_str(&text)
            .map_err(|e| StageError::at(Stage::Validate)(e.into()))?;
        validate_schema(&response_schema, &value, SchemaKind::Response)
            .map_err(StageError::at(Stage::Validate))?;

        Ok(reconcile(&response_schema, &value))
    }

    // Everything up to the model call: payload, slice, schemas, prompt.
    fn prepare(&self, ctx: &AttemptContext, hooks: &HookSet) -> Result<(String, String, Value)> {
        let payload = hooks.apply_pre_prompt(ctx.payload.clone())?.into_json()?;
        let slice = slice(&self.inner.document, &ctx.path, &ctx.method)?;

        if self.inner.validate_request {
            let schema = schema_for(&slice, SchemaKind::Request)?;
            validate_schema(schema, &payload, SchemaKind::Request).map_err(|e| match e {
                OpenApiLlmError::Validation { errors, .. } => {
                    OpenApiLlmError::InvalidRequest { errors }
                }
                other => other,
            })?;
        }

        // Looked up before the model call so a missing schema costs no tokens.
        let response_schema = schema_for(&slice, SchemaKind::Response)?.clone();
        let system = build_system_prompt(&slice)?;
        let user = serde_json::to_string(&payload)?;
        Ok((system, user, response_schema))
    }
}

/// Builder for [`OpenApiLlm`].
pub struct OpenApiLlmBuilder {
    document: OpenApiDocument,
    config: ClientConfig,
    model: Option<Arc<dyn ModelProvider>>,
    simplifier: SharedSimplifier,
    pre_prompt: Option<PrePromptHook>,
    post_response: Option<PostResponseHook>,
}

impl OpenApiLlmBuilder {
    pub fn new(document: OpenApiDocument) -> Self {
        Self {
            document,
            config: ClientConfig::default(),
            model: None,
            simplifier: Arc::new(IdentitySimplifier),
            pre_prompt: None,
            post_response: None,
        }
    }

    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.config.api_key = api_key.into();
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.config.max_tokens = max_tokens;
        self
    }

    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.config.retry = retry;
        self
    }

    pub fn validate_request(mut self, enabled: bool) -> Self {
        self.config.validate_request = enabled;
        self
    }

    /// Use a custom provider instead of the prefix-selected gateway.
    pub fn provider(mut self, provider: Arc<dyn ModelProvider>) -> Self {
        self.model = Some(provider);
        self
    }

    pub fn simplifier(mut self, simplifier: impl PayloadSimplifier + 'static) -> Self {
        self.simplifier = Arc::new(simplifier);
        self
    }

    pub fn pre_prompt_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(RequestPayload) -> std::result::Result<RequestPayload, BoxError>
            + Send
            + Sync
            + 'static,
    {
        self.pre_prompt = Some(Arc::new(hook));
        self
    }

    pub fn post_response_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(String) -> std::result::Result<String, BoxError> + Send + Sync + 'static,
    {
        self.post_response = Some(Arc::new(hook));
        self
    }

    pub fn build(self) -> Result<OpenApiLlm> {
        let model: Arc<dyn ModelProvider> = match self.model {
            Some(model) => model,
            None => Arc::new(ModelGateway::new(&self.config)?),
        };

        let hooks = HookRegistry::default();
        hooks.set_pre_prompt(self.pre_prompt);
        hooks.set_post_response(self.post_response);

        debug!(model = model.model_name(), "openapi-llm client ready");
        Ok(OpenApiLlm {
            inner: Arc::new(Inner {
                document: Arc::new(self.document),
                model,
                hooks,
                retry: self.config.retry,
                simplifier: self.simplifier,
                validate_request: self.config.validate_request,
            }),
        })
    }
}
