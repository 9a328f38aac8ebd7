//! OpenAI-compatible chat completions (OpenAI and Mistral) via async-openai.

use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequest,
        CreateChatCompletionRequestArgs, ResponseFormat,
    },
    Client,
};
use async_trait::async_trait;
use tracing::debug;

use super::{http_client, non_empty, ModelProvider};
use crate::config::ClientConfig;
use crate::error::Result;

/// Chat model speaking the OpenAI chat-completions protocol.
pub struct OpenAIChat {
    client: Client<OpenAIConfig>,
    model: String,
    max_tokens: u32,
    temperature: Option<f32>,
    json_mode: bool,
}

impl OpenAIChat {
    pub fn new(config: &ClientConfig, base_url: &str, json_mode: bool) -> Result<Self> {
        let openai_config = OpenAIConfig::new()
            .with_api_key(config.api_key.clone())
            .with_api_base(base_url);
        let client = Client::with_config(openai_config).with_http_client(http_client(config)?);
        Ok(Self {
            client,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            json_mode,
        })
    }

    /// Build the request that `complete` sends.
    #[allow(deprecated)]
    pub fn build_request(&self, system: &str, user: &str) -> Result<CreateChatCompletionRequest> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system)
                .build()?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(user)
                .build()?
                .into(),
        ];

        let mut request = CreateChatCompletionRequestArgs::default();
        request
            .model(&self.model)
            .messages(messages)
            .max_tokens(self.max_tokens);

        if let Some(temp) = self.temperature {
            request.temperature(temp);
        }

        if self.json_mode {
            request.response_format(ResponseFormat::JsonObject);
        }

        Ok(request.build()?)
    }
}

#[async_trait]
impl ModelProvider for OpenAIChat {
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let request = self.build_request(system, user)?;
        let response = self.client.chat().create(request).await?;
        if let Some(usage) = &response.usage {
            debug!(
                model = %self.model,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "chat completion"
            );
        }
        non_empty(
            response
                .choices
                .into_iter()
                .next()
                .and_then(|choice| choice.message.content),
        )
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
