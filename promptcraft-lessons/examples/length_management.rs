//! Lesson 5: length management.
//!
//! The word limit lives in the prompt, the hard cap on the request, and the token budget
//! on our side of the wire.

use anyhow::Result;
use promptcraft::lessons::length::{summarize_within, TokenBudget};
use promptcraft::utils::llm::openai::OpenAIChatEndpoint;
use promptcraft::utils::llm::ConversationConfig;
use promptcraft::utils::token::tiktoken::Tiktoken;

const TEXT: &str = "The Rust compiler enforces memory safety through ownership: every \
value has a single owner, borrows are checked at compile time, and when the owner goes \
out of scope the value is dropped. This removes whole classes of bugs without a garbage \
collector, at the cost of a learning curve that every newcomer knows well.";

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let endpoint = OpenAIChatEndpoint::from_env()?;
    let config = ConversationConfig::from_env();

    let counter = Tiktoken::new(config.model.as_str())?;
    let budget = TokenBudget { max_prompt_tokens: 512 };
    let mut partial_prompt = promptcraft::lessons::length::SUMMARIZE_TEMPLATE.construct_prompt();
    partial_prompt.fill("word_limit", "25").fill("text", TEXT);
    println!("prompt fits a {}-token budget: {}\n", budget.max_prompt_tokens, budget.fits(&partial_prompt, &counter));

    let summary = summarize_within(&endpoint, &config, TEXT, 25, 64).await?;
    println!("summary: {}", summary);
    Ok(())
}
