//! Lesson 3: chain-of-thought prompting.

use anyhow::Result;
use promptcraft::lessons::chain_of_thought;
use promptcraft::utils::llm::openai::OpenAIChatEndpoint;
use promptcraft::utils::llm::ConversationConfig;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let endpoint = OpenAIChatEndpoint::from_env()?;
    let config = ConversationConfig::from_env();

    let question = "A bat and a ball cost $1.10 in total. The bat costs $1.00 more than \
                    the ball. How much does the ball cost?";
    let reasoned = chain_of_thought::solve(&endpoint, &config, question).await?;

    println!("--- reasoning ---\n{}\n", reasoned.reasoning);
    println!("--- answer ---\n{}", reasoned.answer);
    Ok(())
}
