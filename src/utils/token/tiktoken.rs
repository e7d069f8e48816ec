use std::collections::HashMap;

use anyhow::Result;
use async_openai::types::{ChatCompletionRequestMessage, ChatCompletionRequestMessageContentPart, ChatCompletionRequestUserMessageContent};
use lazy_static::lazy_static;
use log::warn;
pub use tiktoken_rs::{cl100k_base, get_bpe_from_model, CoreBPE};

use crate::utils::token::CountToken;

const TOKENS_PER_MESSAGE: usize = 3;
const TOKENS_PER_NAME: usize = 1;

/// Window assumed for model ids absent from [MODEL_TO_CONTEXT_WINDOW].
pub const DEFAULT_CONTEXT_WINDOW: usize = 4096;

lazy_static! {
    /// const map from model name to context window size.
    /// TODO: when `LazyCell` is stabilized, use that instead
    pub static ref MODEL_TO_CONTEXT_WINDOW: HashMap<&'static str, usize> = HashMap::from([
        ("gpt-4", 8192),
        ("gpt-4-32k", 32768),
        ("gpt-4-turbo", 128000),
        ("gpt-4o", 128000),
        ("gpt-4o-mini", 128000),
        ("gpt-3.5-turbo", 4096),
        ("gpt-3.5-turbo-16k", 16384),
        ("amazon/nova-pro-v1", 300000),
        ("amazon/nova-lite-v1", 300000),
    ]);
}

/// Counter using the Tiktoken tokenizer.
///
/// Routed model ids look like `vendor/model` and rarely name an OpenAI tokenizer; those
/// fall back to `cl100k_base`, which is close enough for budgeting purposes.
#[derive(Clone)]
#[readonly::make]
pub struct Tiktoken {
    /// The model id the counter was created for. read-only.
    #[readonly]
    pub model: String,
    /// The context window the truncation methods fit into. read-only.
    #[readonly]
    pub context_window: usize,
    /// The tokenizer. read-only.
    #[readonly]
    pub bpe: CoreBPE,
}

impl Tiktoken {
    /// Create a new Tiktoken counter.
    pub fn new(model: impl Into<String>) -> Result<Self> {
        let model = model.into();
        let tokenizer_model = model.rsplit('/').next().unwrap_or(model.as_str());
        let bpe = match get_bpe_from_model(tokenizer_model) {
            Ok(bpe) => bpe,
            Err(_) => {
                warn!("no tokenizer known for model {}, falling back to cl100k_base", model);
                cl100k_base()?
            }
        };
        let context_window = MODEL_TO_CONTEXT_WINDOW
            .get(model.as_str())
            .copied()
            .unwrap_or(DEFAULT_CONTEXT_WINDOW);
        Ok(Tiktoken {
            model,
            context_window,
            bpe,
        })
    }

    /// Same counter with an explicit context window.
    pub fn with_context_window(mut self, context_window: usize) -> Self {
        self.context_window = context_window;
        self
    }

    /// Count the number of tokens in a chat message. Following best practices from the OpenAI example.
    pub fn count_msg_token(&self, msg: &ChatCompletionRequestMessage) -> usize {
        let content_token_count = match msg {
            ChatCompletionRequestMessage::System(msg) => self.count_token(msg.content.as_str()),
            ChatCompletionRequestMessage::User(msg) => match &msg.content {
                ChatCompletionRequestUserMessageContent::Text(s) => self.count_token(s),
                ChatCompletionRequestUserMessageContent::Array(msg_parts) =>
                    msg_parts
                        .iter()
                        .map(|msg_part| {
                            match msg_part {
                                ChatCompletionRequestMessageContentPart::Text(text_part) => self.count_token(text_part.text.as_str()),
                                ChatCompletionRequestMessageContentPart::Image(_) => {
                                    warn!("Image message is not supported because we need to know the image size after fetching from the url");
                                    0
                                }
                            }
                        })
                        .sum()
            },
            ChatCompletionRequestMessage::Assistant(msg) => msg.content.as_ref().map_or(0, |msg| self.count_token(msg)),
            ChatCompletionRequestMessage::Tool(msg) => self.count_token(msg.content.as_str()),
            ChatCompletionRequestMessage::Function(msg) => msg.content.as_ref().map_or(0, |msg| self.count_token(msg)),
        };
        let name_token_count = match msg {
            ChatCompletionRequestMessage::System(msg) if msg.name.is_some() => TOKENS_PER_NAME,
            ChatCompletionRequestMessage::User(msg) if msg.name.is_some() => TOKENS_PER_NAME,
            ChatCompletionRequestMessage::Assistant(msg) if msg.name.is_some() => TOKENS_PER_NAME,
            _ => 0
        };
        content_token_count + name_token_count + TOKENS_PER_MESSAGE
    }

    /// Drop the oldest turns until the rest fits the context window. When a system message
    /// is given, it survives truncation as the first message.
    #[inline]
    pub fn truncate_messages(&self,
                             messages: &Vec<ChatCompletionRequestMessage>,
                             system_message: Option<ChatCompletionRequestMessage>) -> Vec<ChatCompletionRequestMessage> {
        if messages.is_empty() {
            return messages.clone();
        }
        let max_tokens = self.context_window;
        if let Some(sys_prompt) = system_message {
            let sys_prompt_token_count = self.count_msg_token(&sys_prompt);
            assert!(sys_prompt_token_count <= max_tokens, "system message token count {} is greater than max tokens {}", sys_prompt_token_count, max_tokens);
            let truncate_start_idx = self.get_truncate_start_idx(messages, max_tokens - sys_prompt_token_count);
            if truncate_start_idx == 0 {
                let mut new_messages = messages.clone();
                if !messages.first().unwrap().eq(&sys_prompt) {
                    new_messages[0] = sys_prompt;
                }
                new_messages
            } else {
                let mut new_messages = Vec::with_capacity(messages.len() - truncate_start_idx + 1);
                new_messages.push(sys_prompt);
                new_messages.extend_from_slice(&messages[truncate_start_idx..]);
                new_messages
            }
        } else {
            let truncate_start_idx = self.get_truncate_start_idx(messages, max_tokens);
            if truncate_start_idx == 0 {
                messages.clone()
            } else {
                messages[truncate_start_idx..].to_vec()
            }
        }
    }

    pub(crate) fn get_truncate_start_idx(&self,
                                         messages: &Vec<ChatCompletionRequestMessage>,
                                         max_tokens: usize) -> usize {
        if messages.is_empty() {
            return 0;
        }
        let num_messages = messages.len();
        if max_tokens == 0 {
            return num_messages;
        }
        let mut token_count = 0;
        // TODO: make this algorithm more smart as in Python `tokentrim`
        let mut truncate_start_idx = 0;
        for (idx, msg) in messages.iter().enumerate().rev() {
            let message_token_count = self.count_msg_token(msg);
            if token_count + message_token_count > max_tokens {
                truncate_start_idx = idx + 1;
                break;
            }
            token_count += message_token_count;
        }
        truncate_start_idx
    }
}

impl CountToken for Tiktoken {
    fn count_token(&self, string: &str) -> usize {
        self.bpe.encode_with_special_tokens(string).len()
    }
}

#[cfg(test)]
mod test_tiktoken {
    use crate::utils::llm::{system_msg, user_msg};
    use crate::utils::token::CountToken;

    use super::{Tiktoken, DEFAULT_CONTEXT_WINDOW};

    #[test]
    fn test_known_and_routed_models() {
        let counter = Tiktoken::new("gpt-4").unwrap();
        assert_eq!(8192, counter.context_window);
        assert_eq!(0, counter.count_token(""));
        assert!(counter.count_token("hello world") > 0);

        // routed id falls back to cl100k_base instead of panicking
        let routed = Tiktoken::new("some-vendor/some-model-v9").unwrap();
        assert_eq!(DEFAULT_CONTEXT_WINDOW, routed.context_window);
        assert!(routed.count_token("hello world") > 0);
    }

    #[test]
    fn test_truncate_keeps_recent_turns() {
        let counter = Tiktoken::new("gpt-4").unwrap();
        let messages = vec![
            user_msg("the very first message, long forgotten").unwrap(),
            user_msg("the middle message").unwrap(),
            user_msg("the last message").unwrap(),
        ];
        let budget = counter.count_msg_token(&messages[1]) + counter.count_msg_token(&messages[2]);
        let counter = counter.with_context_window(budget);
        let truncated = counter.truncate_messages(&messages, None);
        assert_eq!(&messages[1..], &truncated[..]);
    }

    #[test]
    fn test_truncate_preserves_system_message() {
        let counter = Tiktoken::new("gpt-4").unwrap();
        let sys = system_msg("You are terse.").unwrap();
        let messages = vec![
            user_msg("first").unwrap(),
            user_msg("second").unwrap(),
            user_msg("third").unwrap(),
        ];
        let budget = counter.count_msg_token(&sys)
            + counter.count_msg_token(&messages[1])
            + counter.count_msg_token(&messages[2]);
        let counter = counter.with_context_window(budget);
        let truncated = counter.truncate_messages(&messages, Some(sys.clone()));
        assert_eq!(3, truncated.len());
        assert_eq!(sys, truncated[0]);
        assert_eq!(messages[2], truncated[2]);
    }

    #[test]
    fn test_truncate_noop_when_under_budget() {
        let counter = Tiktoken::new("gpt-4").unwrap();
        let messages = vec![user_msg("tiny").unwrap()];
        let truncated = counter.truncate_messages(&messages, None);
        assert_eq!(messages, truncated);
    }
}
