//! Tower integration: serve operations as a `Service<OperationRequest>`.
//!
//! This lets the client sit behind ordinary tower layers (timeouts,
//! concurrency limits, buffers) like any other service.

use std::task::{Context, Poll};

use futures::future::BoxFuture;
use serde_json::Value;
use tower::Service;

use crate::client::OpenApiLlm;
use crate::error::OpenApiLlmError;
use crate::payload::RequestPayload;

/// One operation invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationRequest {
    pub path: String,
    pub method: String,
    pub payload: RequestPayload,
}

impl OperationRequest {
    pub fn new(
        path: impl Into<String>,
        method: impl Into<String>,
        payload: impl Into<RequestPayload>,
    ) -> Self {
        Self {
            path: path.into(),
            method: method.into(),
            payload: payload.into(),
        }
    }
}

impl Service<OperationRequest> for OpenApiLlm {
    type Response = Value;
    type Error = OpenApiLlmError;
    type Future = BoxFuture<'static, Result<Value, OpenApiLlmError>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: OperationRequest) -> Self::Future {
        let client = self.clone();
        Box::pin(async move {
            client
                .call_operation(&req.path, &req.method, req.payload)
                .await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::OpenApiDocument;
    use crate::provider::ScriptedModel;
    use serde_json::json;
    use std::sync::Arc;
    use tower::ServiceExt;

    #[tokio::test]
    async fn oneshot_serves_operation() {
        let doc = OpenApiDocument::from_value(json!({
            "openapi": "3.0.0",
            "info": {"title": "t", "version": "1"},
            "paths": {"/ping": {"get": {"responses": {"200": {"content": {
                "application/json": {"schema": {
                    "type": "object",
                    "properties": {"pong": {"type": "boolean"}}
                }}
            }}}}}}
        }))
        .unwrap();
        let llm = OpenApiLlm::builder(doc)
            .provider(Arc::new(ScriptedModel::always("{}")))
            .build()
            .unwrap();

        let out = llm
            .oneshot(OperationRequest::new("/ping", "GET", json!({})))
            .await
            .unwrap();
        assert_eq!(out, json!({"pong": false}));
    }
}
