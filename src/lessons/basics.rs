//! Single-turn and multi-turn prompting.
//!
//! The single-turn shape is the whole pipeline in one line of data flow:
//! `PromptTemplate -> PartialPrompt -> complete prompt -> endpoint -> reply`.
//! The multi-turn shape adds conversational memory: a [SessionStore] keyed by an opaque
//! session id, so the model sees every prior turn of the session on each request.

use anyhow::Result;
use lazy_static::lazy_static;

use crate::filler::{DateFiller, Fill};
use crate::prompt::PromptTemplate;
use crate::utils::llm::{system_msg, user_msg, CompleteChat, ConversationConfig, SessionStore};

/// System prompt shared by the basic lessons.
pub const ASSISTANT_SYSTEM_PROMPT: &str = "You are a concise and helpful assistant.";

lazy_static! {
    /// The single-turn lesson template.
    pub static ref EXPLAIN_TEMPLATE: PromptTemplate =
        PromptTemplate::new("Explain {{topic}} to a beginner in at most three sentences.");

    /// System prompt with the current date filled in at request time.
    pub static ref DATED_SYSTEM_TEMPLATE: PromptTemplate =
        PromptTemplate::new("You are a concise and helpful assistant. Today is {{date}}.");
}

/// [ASSISTANT_SYSTEM_PROMPT] plus today's date, via [DateFiller].
pub fn dated_system_prompt() -> Result<String> {
    let mut partial_prompt = DATED_SYSTEM_TEMPLATE.construct_prompt();
    DateFiller::new().fill(&mut partial_prompt)?;
    Ok(partial_prompt.complete()?)
}

/// One templated request, no memory: render the template and send it.
pub async fn ask_once<E: CompleteChat + Sync>(endpoint: &E,
                                              config: &ConversationConfig,
                                              topic: &str) -> Result<String> {
    let prompt = EXPLAIN_TEMPLATE
        .construct_prompt()
        .fill("topic", topic)
        .complete()?;
    let messages = vec![system_msg(dated_system_prompt()?)?, user_msg(prompt)?];
    endpoint.complete_chat(messages, config, None).await?.text()
}

/// One turn of a session: first use opens the session with the system prompt, every
/// later use replays the accumulated history before the new user message.
pub async fn continue_session<E: CompleteChat + Sync>(endpoint: &E,
                                                      store: &mut SessionStore,
                                                      session_id: &str,
                                                      user_message: &str) -> Result<String> {
    let conversation = store.session(session_id);
    if conversation.history.is_empty() {
        conversation.push_system(ASSISTANT_SYSTEM_PROMPT)?;
    }
    conversation.ask(endpoint, user_message).await
}
