//! Length management: keeping prompts inside a token budget and replies inside a cap.
//!
//! Three levers, in the order the tutorial introduces them: instruct the model
//! ([SUMMARIZE_TEMPLATE] carries a word limit), cap the reply (`max_tokens` on the
//! request), and trim the prompt side (budget checks and history truncation).

use anyhow::Result;
use async_openai::types::ChatCompletionRequestMessage;
use lazy_static::lazy_static;

use crate::prompt::errors::PlaceholderNotExist;
use crate::prompt::{PartialPrompt, PromptTemplate};
use crate::utils::llm::{user_msg, CompleteChat, Conversation, ConversationConfig};
use crate::utils::token::tiktoken::Tiktoken;
use crate::utils::token::CountToken;

lazy_static! {
    /// Summarization with an instructed word limit.
    pub static ref SUMMARIZE_TEMPLATE: PromptTemplate = PromptTemplate::new(
        "Summarize the following text in at most {{word_limit}} words:\n\n{{text}}");
}

/// A prompt-side token budget.
#[derive(Debug, Clone, Copy)]
pub struct TokenBudget {
    pub max_prompt_tokens: usize,
}

impl TokenBudget {
    /// Whether the partial prompt currently fits, unfilled placeholders counted by name.
    pub fn fits(&self, partial_prompt: &PartialPrompt, counter: &impl CountToken) -> bool {
        partial_prompt.current_token_num(counter) <= self.max_prompt_tokens
    }

    /// Whether filling `placeholder` with `value` would keep the prompt inside the
    /// budget. Counts through the cache, so the template is not re-counted.
    pub fn admits_fill(&self,
                       partial_prompt: &PartialPrompt,
                       counter: &impl CountToken,
                       placeholder: &str,
                       value: &str) -> Result<bool, PlaceholderNotExist> {
        partial_prompt
            .with_counter_cache(counter)
            .attempt_fill_and_count(placeholder, value)
            .map(|token_num| token_num <= self.max_prompt_tokens)
    }
}

/// Ask for a summary with both levers applied: the word limit in the prompt and the hard
/// `max_tokens` cap on the reply.
pub async fn summarize_within<E: CompleteChat + Sync>(endpoint: &E,
                                                      config: &ConversationConfig,
                                                      text: &str,
                                                      word_limit: usize,
                                                      max_tokens: u16) -> Result<String> {
    let prompt = SUMMARIZE_TEMPLATE
        .construct_prompt()
        .fill("word_limit", word_limit.to_string())
        .fill("text", text)
        .complete()?;
    let config = config.clone().with_max_tokens(max_tokens);
    endpoint.complete_chat(vec![user_msg(prompt)?], &config, None).await?.text()
}

/// Trim a conversation's history in place to the counter's context window, dropping the
/// oldest turns first. A leading system message survives the cut.
pub fn condense_history(counter: &Tiktoken, conversation: &mut Conversation) {
    let system_message = conversation.history.first()
        .filter(|message| matches!(message, ChatCompletionRequestMessage::System(_)))
        .cloned();
    conversation.history = counter.truncate_messages(&conversation.history, system_message);
}

#[cfg(test)]
mod test_length {
    use crate::prompt::PromptTemplate;
    use crate::utils::llm::testing::ScriptedEndpoint;
    use crate::utils::llm::{Conversation, ConversationConfig};
    use crate::utils::token::count_tokens_by_len;
    use crate::utils::token::tiktoken::Tiktoken;

    use super::{condense_history, summarize_within, TokenBudget};

    #[test]
    fn test_budget_fits() {
        let template = PromptTemplate::new("Say {{word}}.");
        let mut partial_prompt = template.construct_prompt();
        partial_prompt.fill("word", "hi");
        let budget = TokenBudget { max_prompt_tokens: 100 };
        assert!(budget.fits(&partial_prompt, &count_tokens_by_len));
        let tight = TokenBudget { max_prompt_tokens: 5 };
        assert!(!tight.fits(&partial_prompt, &count_tokens_by_len));
    }

    #[test]
    fn test_budget_admits_fill() {
        let template = PromptTemplate::new("Say {{word}}.");
        let partial_prompt = template.construct_prompt();
        let budget = TokenBudget { max_prompt_tokens: "Say {{}}.".len() + 3 };
        assert!(budget.admits_fill(&partial_prompt, &count_tokens_by_len, "word", "abc").unwrap());
        assert!(!budget.admits_fill(&partial_prompt, &count_tokens_by_len, "word", "abcdefgh").unwrap());
        assert!(budget.admits_fill(&partial_prompt, &count_tokens_by_len, "wrod", "abc").is_err());
    }

    #[tokio::test]
    async fn test_summarize_within_caps_the_reply() {
        let endpoint = ScriptedEndpoint::with_texts(&["A short summary."]);
        let config = ConversationConfig::default();
        let summary = summarize_within(&endpoint, &config, "A very long text...", 20, 64).await.unwrap();
        assert_eq!("A short summary.", summary);
        assert_eq!(Some(64), endpoint.config(0).max_tokens);
    }

    #[test]
    fn test_condense_history_keeps_system_and_recent_turns() {
        let mut conversation = Conversation::with_system(ConversationConfig::default(), "Be terse.").unwrap();
        conversation.push_user("first question, the one to forget").unwrap();
        conversation.push_assistant("first answer, also forgettable").unwrap();
        conversation.push_user("the question that matters").unwrap();

        let counter = Tiktoken::new("gpt-4").unwrap();
        let system_tokens = counter.count_msg_token(&conversation.history[0]);
        let last_tokens = counter.count_msg_token(&conversation.history[3]);
        let counter = counter.with_context_window(system_tokens + last_tokens);

        condense_history(&counter, &mut conversation);
        assert_eq!(2, conversation.history.len());
        assert!(matches!(conversation.history[0], async_openai::types::ChatCompletionRequestMessage::System(_)));
        assert_eq!("the question that matters",
                   match &conversation.history[1] {
                       async_openai::types::ChatCompletionRequestMessage::User(user) => match &user.content {
                           async_openai::types::ChatCompletionRequestUserMessageContent::Text(text) => text.as_str(),
                           _ => panic!("expected text"),
                       },
                       _ => panic!("expected a user message"),
                   });
    }
}
