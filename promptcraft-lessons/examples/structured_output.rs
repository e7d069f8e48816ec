//! Lesson 6: structured output via function calling.
//!
//! Extract structured data from natural language: the model is handed the `record_person`
//! schema and its reply parses into a typed struct.

use anyhow::Result;
use promptcraft::lessons::structured;
use promptcraft::utils::llm::openai::OpenAIChatEndpoint;
use promptcraft::utils::llm::ConversationConfig;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let endpoint = OpenAIChatEndpoint::from_env()?;
    let config = ConversationConfig::from_env();

    let person = structured::extract_person(&endpoint, &config, "Harry Potter").await?;
    println!("{}", person.name);
    println!("{}", person.date_of_birth);
    println!("{}", person.occupation);
    Ok(())
}
