//! Structured output via function calling.
//!
//! Instead of prose, the model is handed a function schema and told to call it; the
//! reply then carries a JSON `arguments` string matching the schema, which parses
//! straight into a typed struct. Models routed through third-party services do not
//! always honor the tool choice, so a prose reply embedding JSON is accepted as a
//! fallback.

use anyhow::{anyhow, Context, Result};
use async_openai::types::{
    ChatCompletionNamedToolChoice, ChatCompletionTool, ChatCompletionToolChoiceOption,
    ChatCompletionToolType, FunctionName, FunctionObject,
};
use chrono::NaiveDate;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::prompt::PromptTemplate;
use crate::utils::llm::{user_msg, ChatReply, CompleteChat, ConversationConfig, ToolSpec};
use crate::utils::postprocess::json::filter_to_json;

/// Name of the function the model is asked to call.
pub const PERSON_TOOL_NAME: &str = "record_person";

lazy_static! {
    pub static ref PROFILE_TEMPLATE: PromptTemplate =
        PromptTemplate::new("Can you tell me about {{subject}}'s profile?");
}

/// The desired output structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    /// The person's full name
    pub name: String,
    /// The person's date of birth in ISO 8601 format (YYYY-MM-DD)
    pub date_of_birth: NaiveDate,
    /// The person's current job or profession
    pub occupation: String,
}

/// The function schema for [Person], with the tool choice pinned to it.
pub fn person_tool_spec() -> ToolSpec {
    let parameters = json!({
        "type": "object",
        "properties": {
            "name": {
                "type": "string",
                "description": "The person's full name"
            },
            "date_of_birth": {
                "type": "string",
                "description": "The person's date of birth in ISO 8601 format (YYYY-MM-DD)"
            },
            "occupation": {
                "type": "string",
                "description": "The person's current job or profession"
            }
        },
        "required": ["name", "date_of_birth", "occupation"]
    });
    ToolSpec {
        tools: vec![ChatCompletionTool {
            r#type: ChatCompletionToolType::Function,
            function: FunctionObject {
                name: PERSON_TOOL_NAME.to_string(),
                description: Some("Record a person's profile".to_string()),
                parameters: Some(parameters),
            },
        }],
        tool_choice: Some(ChatCompletionToolChoiceOption::Named(ChatCompletionNamedToolChoice {
            r#type: ChatCompletionToolType::Function,
            function: FunctionName { name: PERSON_TOOL_NAME.to_string() },
        })),
    }
}

/// Parse the `arguments` JSON string of a [PERSON_TOOL_NAME] call.
pub fn parse_person_arguments(arguments: &str) -> Result<Person> {
    serde_json::from_str(arguments)
        .with_context(|| format!("malformed person arguments: {}", arguments))
}

fn parse_person_from_text(content: &str) -> Result<Person> {
    let value = filter_to_json(content)?;
    serde_json::from_value(value).context("the filtered JSON does not describe a person")
}

/// A [Person] out of a reply: the tool call when the model made one, the JSON embedded
/// in the text content otherwise.
pub fn person_from_reply(reply: &ChatReply) -> Result<Person> {
    if let Some(call) = reply.tool_calls.iter().find(|call| call.name == PERSON_TOOL_NAME) {
        return parse_person_arguments(&call.arguments);
    }
    match &reply.content {
        Some(content) => parse_person_from_text(content),
        None => Err(anyhow!("the reply carries neither a tool call nor text content")),
    }
}

/// Extract structured data about `subject` from natural language.
pub async fn extract_person<E: CompleteChat + Sync>(endpoint: &E,
                                                    config: &ConversationConfig,
                                                    subject: &str) -> Result<Person> {
    let prompt = PROFILE_TEMPLATE
        .construct_prompt()
        .fill("subject", subject)
        .complete()?;
    let tools = person_tool_spec();
    let reply = endpoint.complete_chat(vec![user_msg(prompt)?], config, Some(&tools)).await?;
    person_from_reply(&reply)
}
