//! Lesson 1: a single templated request.

use anyhow::Result;
use promptcraft::lessons::basics;
use promptcraft::utils::llm::openai::OpenAIChatEndpoint;
use promptcraft::utils::llm::ConversationConfig;
use promptcraft::utils::printing::MarkdownPrinter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let endpoint = OpenAIChatEndpoint::from_env()?;
    let config = ConversationConfig::from_env();

    let reply = basics::ask_once(&endpoint, &config, "the borrow checker").await?;
    MarkdownPrinter::default().print(&reply);
    Ok(())
}
