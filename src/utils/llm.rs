//! The LLM endpoint layer: the seam between prompts and the chat-completions wire.
//!
//! Lessons talk to [CompleteChat], never to a concrete HTTP client, so every lesson can be
//! exercised in tests with a scripted endpoint. The production implementation lives in
//! [openai] and speaks to any OpenAI-compatible chat-completions API through a configurable
//! base URL, e.g. a routing service like OpenRouter.

pub mod openai;

use std::collections::HashMap;

use anyhow::{anyhow, Result};
use async_openai::error::OpenAIError;
use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    ChatCompletionTool, ChatCompletionToolChoiceOption, Stop,
};
use async_trait::async_trait;

/// The model id the tutorials use unless `OPENROUTER_MODEL` says otherwise.
pub const DEFAULT_MODEL: &str = "amazon/nova-pro-v1";

/// Environment variable overriding the model id routed to.
pub const MODEL_ENV_VAR: &str = "OPENROUTER_MODEL";

/// Sampling configuration of a conversation. Mirrors the knobs of
/// `async_openai::types::CreateChatCompletionRequest`; `None` leaves the endpoint default.
#[derive(Debug, Clone)]
pub struct ConversationConfig {
    pub model: String,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub max_tokens: Option<u16>,
    pub presence_penalty: Option<f32>,
    pub frequency_penalty: Option<f32>,
    pub stop: Option<Stop>,
    pub user: Option<String>,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: None,
            top_p: None,
            max_tokens: None,
            presence_penalty: None,
            frequency_penalty: None,
            stop: None,
            user: None,
        }
    }
}

impl ConversationConfig {
    /// Default config, with the model id taken from `OPENROUTER_MODEL` when set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(model) = std::env::var(MODEL_ENV_VAR) {
            config.model = model;
        }
        config
    }

    /// Same config with the reply capped at `max_tokens`.
    pub fn with_max_tokens(mut self, max_tokens: u16) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// A function/tool schema plus an optional tool-choice directive, forwarded verbatim
/// with the request.
#[derive(Debug, Clone)]
pub struct ToolSpec {
    pub tools: Vec<ChatCompletionTool>,
    pub tool_choice: Option<ChatCompletionToolChoiceOption>,
}

/// A tool call emitted by the model. `arguments` is a JSON string that still needs parsing.
#[derive(Debug, Clone)]
pub struct ToolInvocation {
    pub name: String,
    pub arguments: String,
}

/// The `choices[0].message` payload of a chat completion: plain text, structured tool
/// calls, or both.
#[derive(Debug, Clone, Default)]
pub struct ChatReply {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolInvocation>,
}

impl ChatReply {
    /// The text content of the reply, or an error if the model returned none.
    pub fn text(self) -> Result<String> {
        self.content.ok_or_else(|| anyhow!("the reply has no text content"))
    }
}

/// The endpoint seam: consumes an ordered list of role-tagged messages, produces a reply.
#[async_trait]
pub trait CompleteChat {
    async fn complete_chat(&self,
                           messages: Vec<ChatCompletionRequestMessage>,
                           config: &ConversationConfig,
                           tools: Option<&ToolSpec>) -> Result<ChatReply>;
}

/// Build a system message.
pub fn system_msg(content: impl Into<String>) -> Result<ChatCompletionRequestMessage, OpenAIError> {
    let content: String = content.into();
    Ok(ChatCompletionRequestSystemMessageArgs::default()
        .content(content)
        .build()?
        .into())
}

/// Build a user message.
pub fn user_msg(content: impl Into<String>) -> Result<ChatCompletionRequestMessage, OpenAIError> {
    let content: String = content.into();
    Ok(ChatCompletionRequestUserMessageArgs::default()
        .content(content)
        .build()?
        .into())
}

/// Build an assistant message.
pub fn assistant_msg(content: impl Into<String>) -> Result<ChatCompletionRequestMessage, OpenAIError> {
    let content: String = content.into();
    Ok(ChatCompletionRequestAssistantMessageArgs::default()
        .content(content)
        .build()?
        .into())
}

/// An ordered list of prior turns plus the sampling config they are sent with.
///
/// Calls are strictly sequential: [Conversation::ask] blocks until the reply arrives and
/// appends it to the history before anything else can be sent.
#[derive(Debug, Clone)]
pub struct Conversation {
    pub config: ConversationConfig,
    pub history: Vec<ChatCompletionRequestMessage>,
}

impl Conversation {
    pub fn new(config: ConversationConfig) -> Self {
        Self {
            config,
            history: Vec::new(),
        }
    }

    /// A conversation opened with a system message.
    pub fn with_system(config: ConversationConfig, system: impl Into<String>) -> Result<Self, OpenAIError> {
        let mut conversation = Self::new(config);
        conversation.push_system(system)?;
        Ok(conversation)
    }

    pub fn push_system(&mut self, content: impl Into<String>) -> Result<&mut Self, OpenAIError> {
        self.history.push(system_msg(content)?);
        Ok(self)
    }

    pub fn push_user(&mut self, content: impl Into<String>) -> Result<&mut Self, OpenAIError> {
        self.history.push(user_msg(content)?);
        Ok(self)
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) -> Result<&mut Self, OpenAIError> {
        self.history.push(assistant_msg(content)?);
        Ok(self)
    }

    /// Send the user message along with the whole history, record the assistant reply and
    /// return its text.
    pub async fn ask<E: CompleteChat + Sync>(&mut self, endpoint: &E, user_message: impl Into<String> + Send) -> Result<String> {
        self.push_user(user_message)?;
        let reply = endpoint.complete_chat(self.history.clone(), &self.config, None).await?;
        let text = reply.text()?;
        self.push_assistant(text.as_str())?;
        Ok(text)
    }
}

/// In-memory conversational memory: opaque session id -> [Conversation].
///
/// Get-or-create semantics, no eviction and no durability; history lives exactly as long
/// as the store does.
#[derive(Debug, Clone)]
pub struct SessionStore {
    config: ConversationConfig,
    sessions: HashMap<String, Conversation>,
}

impl SessionStore {
    /// A store whose sessions all start from `config`.
    pub fn new(config: ConversationConfig) -> Self {
        Self {
            config,
            sessions: HashMap::new(),
        }
    }

    /// The conversation of `session_id`, created empty on first use.
    pub fn session(&mut self, session_id: impl Into<String>) -> &mut Conversation {
        let config = self.config.clone();
        self.sessions
            .entry(session_id.into())
            .or_insert_with(|| Conversation::new(config))
    }

    /// Drop a session and return its history, if any.
    pub fn end(&mut self, session_id: &str) -> Option<Conversation> {
        self.sessions.remove(session_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}


#[cfg(test)]
mod test_llm {
    use async_openai::types::ChatCompletionRequestMessage;

    use super::testing::ScriptedEndpoint;
    use super::{ChatReply, Conversation, ConversationConfig, SessionStore};

    #[test]
    fn test_reply_text() {
        let reply = ChatReply { content: Some("hi".to_string()), tool_calls: Vec::new() };
        assert_eq!("hi", reply.text().unwrap());
        let empty = ChatReply::default();
        assert!(empty.text().is_err());
    }

    #[tokio::test]
    async fn test_ask_appends_both_turns() {
        let endpoint = ScriptedEndpoint::with_texts(&["Hello there."]);
        let mut conversation = Conversation::with_system(ConversationConfig::default(), "Be brief.").unwrap();
        let reply = conversation.ask(&endpoint, "Say hello.").await.unwrap();
        assert_eq!("Hello there.", reply);
        // system + user + assistant
        assert_eq!(3, conversation.history.len());
        assert!(matches!(conversation.history[1], ChatCompletionRequestMessage::User(_)));
        assert!(matches!(conversation.history[2], ChatCompletionRequestMessage::Assistant(_)));
        // the request carried the history known at send time
        assert_eq!(2, endpoint.request(0).len());
    }

    #[tokio::test]
    async fn test_session_store_keeps_history_per_session() {
        let endpoint = ScriptedEndpoint::with_texts(&["one", "two", "other"]);
        let mut store = SessionStore::new(ConversationConfig::default());
        store.session("alice").ask(&endpoint, "first").await.unwrap();
        store.session("alice").ask(&endpoint, "second").await.unwrap();
        store.session("bob").ask(&endpoint, "hello").await.unwrap();

        assert_eq!(2, store.len());
        assert_eq!(4, store.session("alice").history.len());
        assert_eq!(2, store.session("bob").history.len());
        // the second request of the session replayed the first exchange
        assert_eq!(3, endpoint.request(1).len());

        assert!(store.end("alice").is_some());
        assert!(store.end("alice").is_none());
        assert_eq!(1, store.len());
    }
}
