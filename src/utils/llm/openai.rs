//! The production endpoint: an OpenAI-compatible chat-completions API behind a
//! configurable base URL, e.g. OpenRouter. Credentials come from the environment.

use std::env;

use anyhow::{bail, Context, Result};
use async_openai::config::OpenAIConfig;
use async_openai::error::OpenAIError;
use async_openai::types::{ChatCompletionRequestMessage, CreateChatCompletionRequest, CreateChatCompletionRequestArgs};
use async_openai::Client;
use async_trait::async_trait;
use log::{debug, info};
use url::Url;

use crate::utils::llm::{ChatReply, CompleteChat, ConversationConfig, ToolInvocation, ToolSpec};

/// Bearer key of the routing service.
pub const API_KEY_ENV_VAR: &str = "OPENROUTER_API_KEY";

/// Base URL of the chat-completions API, e.g. `https://openrouter.ai/api/v1`.
pub const BASE_URL_ENV_VAR: &str = "OPENROUTER_BASE_URL";

/// A chat-completions endpoint backed by `async_openai`.
#[derive(Debug, Clone)]
pub struct OpenAIChatEndpoint {
    pub client: Client<OpenAIConfig>,
}

impl OpenAIChatEndpoint {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        let config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(base_url);
        Self {
            client: Client::with_config(config),
        }
    }

    /// Read `OPENROUTER_API_KEY` and `OPENROUTER_BASE_URL` and build the endpoint.
    /// The base URL must parse as an absolute URL.
    pub fn from_env() -> Result<Self> {
        let api_key = env::var(API_KEY_ENV_VAR)
            .with_context(|| format!("{} is not set", API_KEY_ENV_VAR))?;
        let base_url = env::var(BASE_URL_ENV_VAR)
            .with_context(|| format!("{} is not set", BASE_URL_ENV_VAR))?;
        let base_url = Url::parse(&base_url)
            .with_context(|| format!("{} is not a valid URL: {}", BASE_URL_ENV_VAR, base_url))?;
        info!("using chat-completions endpoint at {}", base_url);
        Ok(Self::new(api_key, base_url.as_str().trim_end_matches('/')))
    }
}

fn build_request(messages: Vec<ChatCompletionRequestMessage>,
                 config: &ConversationConfig,
                 tools: Option<&ToolSpec>) -> Result<CreateChatCompletionRequest, OpenAIError> {
    let mut builder = CreateChatCompletionRequestArgs::default();
    builder.model(config.model.as_str()).messages(messages);
    if let Some(temperature) = config.temperature {
        builder.temperature(temperature);
    }
    if let Some(top_p) = config.top_p {
        builder.top_p(top_p);
    }
    if let Some(max_tokens) = config.max_tokens {
        builder.max_tokens(max_tokens);
    }
    if let Some(presence_penalty) = config.presence_penalty {
        builder.presence_penalty(presence_penalty);
    }
    if let Some(frequency_penalty) = config.frequency_penalty {
        builder.frequency_penalty(frequency_penalty);
    }
    if let Some(stop) = &config.stop {
        builder.stop(stop.clone());
    }
    if let Some(user) = &config.user {
        builder.user(user.as_str());
    }
    if let Some(spec) = tools {
        builder.tools(spec.tools.clone());
        if let Some(tool_choice) = &spec.tool_choice {
            builder.tool_choice(tool_choice.clone());
        }
    }
    builder.build()
}

#[async_trait]
impl CompleteChat for OpenAIChatEndpoint {
    async fn complete_chat(&self,
                           messages: Vec<ChatCompletionRequestMessage>,
                           config: &ConversationConfig,
                           tools: Option<&ToolSpec>) -> Result<ChatReply> {
        let request = build_request(messages, config, tools)?;
        debug!("requesting a chat completion from model {}", config.model);
        let mut response = self.client.chat().create(request).await?;
        if response.choices.is_empty() {
            bail!("the chat-completion response contained no choices");
        }
        let message = response.choices.swap_remove(0).message;
        let tool_calls = message.tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|call| ToolInvocation {
                name: call.function.name,
                arguments: call.function.arguments,
            })
            .collect();
        Ok(ChatReply {
            content: message.content,
            tool_calls,
        })
    }
}

#[cfg(test)]
mod test_openai {
    use crate::utils::llm::{user_msg, ConversationConfig};

    use super::build_request;

    #[test]
    fn test_build_request_with_sampling_knobs() {
        let mut config = ConversationConfig::default();
        config.temperature = Some(0.2);
        config.max_tokens = Some(64);
        let request = build_request(vec![user_msg("hi").unwrap()], &config, None).unwrap();
        assert_eq!(config.model, request.model);
        assert_eq!(Some(0.2), request.temperature);
        assert_eq!(Some(64), request.max_tokens);
        assert_eq!(1, request.messages.len());
        assert!(request.tools.is_none());
    }
}
