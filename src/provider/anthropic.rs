//! Anthropic Messages API backend.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{http_client, non_empty, ModelProvider};
use crate::config::ClientConfig;
use crate::error::{OpenApiLlmError, Result};

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Chat model speaking the Anthropic Messages protocol.
pub struct AnthropicChat {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
pub(crate) struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    system: String,
    messages: Vec<AnthropicMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    content: Vec<AnthropicBlock>,
}

#[derive(Debug, Deserialize)]
struct AnthropicBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl AnthropicChat {
    pub fn new(config: &ClientConfig, base_url: &str) -> Result<Self> {
        Ok(Self {
            client: http_client(config)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }

    pub(crate) fn build_request(&self, system: &str, user: &str) -> AnthropicRequest {
        AnthropicRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            system: system.to_string(),
            messages: vec![AnthropicMessage {
                role: "user",
                content: user.to_string(),
            }],
            temperature: self.temperature,
        }
    }
}

fn response_text(response: AnthropicResponse) -> Option<String> {
    let texts: Vec<String> = response
        .content
        .into_iter()
        .filter(|b| b.kind == "text")
        .filter_map(|b| b.text)
        .collect();
    if texts.is_empty() {
        None
    } else {
        Some(texts.concat())
    }
}

#[async_trait]
impl ModelProvider for AnthropicChat {
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let response = self
            .client
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&self.build_request(system, user))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OpenApiLlmError::Provider {
                provider: "anthropic",
                message: format!("{}: {}", status, body),
            });
        }

        let body: AnthropicResponse = response.json().await?;
        non_empty(response_text(body))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_wire_format() {
        let config = ClientConfig::new("claude-3-haiku-20240307", "k");
        let chat = AnthropicChat::new(&config, "https://api.anthropic.com/v1").unwrap();
        let body = serde_json::to_value(chat.build_request("sys", "{}")).unwrap();
        assert_eq!(
            body,
            json!({
                "model": "claude-3-haiku-20240307",
                "max_tokens": 2048,
                "system": "sys",
                "messages": [{"role": "user", "content": "{}"}]
            })
        );
    }

    #[test]
    fn keeps_only_text_blocks() {
        let body: AnthropicResponse = serde_json::from_value(json!({
            "content": [
                {"type": "thinking", "thinking": "hmm"},
                {"type": "text", "text": "{\"ok\":true}"}
            ]
        }))
        .unwrap();
        assert_eq!(response_text(body).as_deref(), Some("{\"ok\":true}"));
    }
}
