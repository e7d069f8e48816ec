//! Lesson 4: prompt chaining and validated generation.
//!
//! First a plain two-stage chain, then the bounded retry loop: generate a year, check it
//! with a second call, try again on rejection, and settle for the sentinel after three
//! failed attempts.

use anyhow::Result;
use promptcraft::lessons::chaining;
use promptcraft::prompt::PromptTemplate;
use promptcraft::utils::llm::openai::OpenAIChatEndpoint;
use promptcraft::utils::llm::ConversationConfig;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let endpoint = OpenAIChatEndpoint::from_env()?;
    let config = ConversationConfig::from_env();

    let stages = vec![
        PromptTemplate::new("Name one striking fact about {{input}}. One sentence."),
        PromptTemplate::new("Turn this fact into a quiz question: {{input}}"),
    ];
    let quiz_question = chaining::pipe(&endpoint, &config, &stages, "the Eiffel Tower").await?;
    println!("chained result: {}\n", quiz_question);

    let year = chaining::generate_validated_year(&endpoint, &config, "the first Moon landing take place").await;
    println!("validated year: {}", year);
    Ok(())
}
