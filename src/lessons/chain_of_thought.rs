//! Chain-of-thought prompting: ask for the reasoning before the answer.
//!
//! The prompt pins down an output shape (free-form reasoning, then one `Final answer:`
//! line) so the reply can be split deterministically afterwards.

use anyhow::{anyhow, Result};
use lazy_static::lazy_static;
use regex::Regex;

use crate::prompt::PromptTemplate;
use crate::utils::llm::{user_msg, CompleteChat, ConversationConfig};

/// The line prefix the model is told to end with.
pub const FINAL_ANSWER_MARKER: &str = "Final answer:";

lazy_static! {
    pub static ref CHAIN_OF_THOUGHT_TEMPLATE: PromptTemplate = PromptTemplate::new(
        "Answer the question below. Let's think step by step: write out your reasoning \
         first, then end with a single line of the form\nFinal answer: <answer>\n\n\
         Question: {{question}}");

    static ref FINAL_ANSWER_RE: Regex = Regex::new(r"(?im)^\s*final answer:\s*(.+?)\s*$").unwrap();
}

/// A reply split into its reasoning and its final answer.
#[derive(Debug, Clone, PartialEq)]
pub struct Reasoned {
    pub reasoning: String,
    pub answer: String,
}

/// Split a reply at its `Final answer:` line. The last such line wins, since models
/// sometimes restate the requested form before using it. `None` when the line is missing.
pub fn split_final_answer(reply: &str) -> Option<Reasoned> {
    let captures = FINAL_ANSWER_RE.captures_iter(reply).last()?;
    let whole_match = captures.get(0).unwrap();
    let answer = captures.get(1).unwrap().as_str().to_string();
    let reasoning = reply[..whole_match.start()].trim().to_string();
    Some(Reasoned { reasoning, answer })
}

/// Ask `question` with the chain-of-thought template and split the reply.
/// Errors when the model ignored the output shape.
pub async fn solve<E: CompleteChat + Sync>(endpoint: &E,
                                           config: &ConversationConfig,
                                           question: &str) -> Result<Reasoned> {
    let prompt = CHAIN_OF_THOUGHT_TEMPLATE
        .construct_prompt()
        .fill("question", question)
        .complete()?;
    let reply = endpoint.complete_chat(vec![user_msg(prompt)?], config, None).await?.text()?;
    split_final_answer(&reply)
        .ok_or_else(|| anyhow!("the reply has no '{}' line:\n{}", FINAL_ANSWER_MARKER, reply))
}
