//! Pre-prompt and post-response hooks.
//!
//! A client holds at most one hook of each kind. Registering a hook replaces
//! the previous one; an absent hook behaves as identity. Hooks are read once
//! at the start of every call, so re-registering between requests is safe.

use std::sync::{Arc, RwLock};

use tower::BoxError;

use crate::error::{OpenApiLlmError, Result};
use crate::payload::RequestPayload;

/// Transforms the caller's payload before the prompt is built.
pub type PrePromptHook =
    Arc<dyn Fn(RequestPayload) -> std::result::Result<RequestPayload, BoxError> + Send + Sync>;

/// Transforms the normalized model text before it is parsed and validated.
pub type PostResponseHook =
    Arc<dyn Fn(String) -> std::result::Result<String, BoxError> + Send + Sync>;

#[derive(Default)]
pub(crate) struct HookRegistry {
    pre_prompt: RwLock<Option<PrePromptHook>>,
    post_response: RwLock<Option<PostResponseHook>>,
}

impl HookRegistry {
    pub(crate) fn set_pre_prompt(&self, hook: Option<PrePromptHook>) {
        *self.pre_prompt.write().unwrap_or_else(|e| e.into_inner()) = hook;
    }

    pub(crate) fn set_post_response(&self, hook: Option<PostResponseHook>) {
        *self.post_response.write().unwrap_or_else(|e| e.into_inner()) = hook;
    }

    pub(crate) fn snapshot(&self) -> HookSet {
        HookSet {
            pre_prompt: self
                .pre_prompt
                .read()
                .unwrap_or_else(|e| e.into_inner())
                .clone(),
            post_response: self
                .post_response
                .read()
                .unwrap_or_else(|e| e.into_inner())
                .clone(),
        }
    }
}

/// The hooks in effect for one attempt.
#[derive(Clone, Default)]
pub struct HookSet {
    pub pre_prompt: Option<PrePromptHook>,
    pub post_response: Option<PostResponseHook>,
}

impl HookSet {
    pub fn apply_pre_prompt(&self, payload: RequestPayload) -> Result<RequestPayload> {
        match &self.pre_prompt {
            Some(hook) => hook(payload).map_err(OpenApiLlmError::hook),
            None => Ok(payload),
        }
    }

    pub fn apply_post_response(&self, text: String) -> Result<String> {
        match &self.post_response {
            Some(hook) => hook(text).map_err(OpenApiLlmError::hook),
            None => Ok(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn suffix(s: &'static str) -> PostResponseHook {
        Arc::new(move |t: String| -> std::result::Result<String, BoxError> {
            Ok(format!("{}{}", t, s))
        })
    }

    #[test]
    fn absent_hooks_are_identity() {
        let hooks = HookRegistry::default().snapshot();
        let payload = RequestPayload::Json(json!({"a": 1}));
        assert_eq!(hooks.apply_pre_prompt(payload.clone()).unwrap(), payload);
        assert_eq!(hooks.apply_post_response("x".into()).unwrap(), "x");
    }

    #[test]
    fn registration_replaces_previous_hook() {
        let registry = HookRegistry::default();
        registry.set_post_response(Some(suffix("1")));
        registry.set_post_response(Some(suffix("2")));
        assert_eq!(registry.snapshot().apply_post_response("v".into()).unwrap(), "v2");

        registry.set_post_response(None);
        assert_eq!(registry.snapshot().apply_post_response("v".into()).unwrap(), "v");
    }

    #[test]
    fn hook_failures_become_hook_errors() {
        let registry = HookRegistry::default();
        let failing: PrePromptHook = Arc::new(
            |_p: RequestPayload| -> std::result::Result<RequestPayload, BoxError> {
                Err("nope".into())
            },
        );
        registry.set_pre_prompt(Some(failing));
        let err = registry
            .snapshot()
            .apply_pre_prompt(RequestPayload::Json(json!({})))
            .unwrap_err();
        assert!(matches!(err, OpenApiLlmError::Hook { .. }));
        assert!(err.is_transient());
    }

    #[test]
    fn snapshot_is_unaffected_by_later_registration() {
        let registry = HookRegistry::default();
        let before = registry.snapshot();
        registry.set_post_response(Some(suffix(" changed")));
        assert_eq!(before.apply_post_response("same".into()).unwrap(), "same");
    }
}
