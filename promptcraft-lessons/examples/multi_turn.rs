//! Lesson 2: multi-turn prompting with an in-memory session.
//!
//! The second question only makes sense because the model sees the first exchange again.

use anyhow::Result;
use promptcraft::lessons::basics;
use promptcraft::utils::llm::openai::OpenAIChatEndpoint;
use promptcraft::utils::llm::{ConversationConfig, SessionStore};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let endpoint = OpenAIChatEndpoint::from_env()?;
    let mut store = SessionStore::new(ConversationConfig::from_env());

    let session_id = "demo";
    for question in [
        "What is the capital of France?",
        "How many people live there?",
    ] {
        println!("> {}", question);
        let reply = basics::continue_session(&endpoint, &mut store, session_id, question).await?;
        println!("{}\n", reply);
    }

    println!("({} turns kept in session {:?})", store.session(session_id).history.len(), session_id);
    Ok(())
}
