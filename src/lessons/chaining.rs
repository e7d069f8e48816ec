//! Prompt chaining: sequencing calls so one reply becomes the next prompt's input, and
//! dynamic generation with validation and a bounded retry.
//!
//! The retry loop is deliberately simple: a fixed attempt cap, regex extraction of the
//! candidate, one validation call, and a fixed sentinel on exhaustion. No backoff, no
//! jitter; an endpoint error and an implausible candidate are the same kind of failed
//! attempt, logged and retried.

use anyhow::Result;
use lazy_static::lazy_static;
use log::{info, warn};

use crate::prompt::PromptTemplate;
use crate::utils::llm::{user_msg, CompleteChat, ConversationConfig};
use crate::utils::postprocess::extract::extract_year;

/// How many times the validated generation tries before giving up.
pub const MAX_ATTEMPTS: usize = 3;

/// What the validated generation returns when every attempt failed.
pub const FAILURE_SENTINEL: &str = "Failed to generate a valid year.";

/// The placeholder every chain stage must carry.
pub const INPUT_PLACEHOLDER: &str = "input";

lazy_static! {
    static ref YEAR_TEMPLATE: PromptTemplate =
        PromptTemplate::new("In which year did {{event}}? Reply with the year alone.");

    static ref VALIDATION_TEMPLATE: PromptTemplate = PromptTemplate::new(
        "Someone claims that {{event}} happened in the year {{year}}. \
         Is that plausible? Reply with yes or no.");
}

/// Run `stages` in order, rendering the previous output into each stage's `{{input}}`
/// slot. Errors if a stage lacks the slot or a call fails; chains are all-or-nothing.
pub async fn pipe<E: CompleteChat + Sync>(endpoint: &E,
                                          config: &ConversationConfig,
                                          stages: &[PromptTemplate],
                                          input: impl Into<String>) -> Result<String> {
    let mut current = input.into();
    for stage in stages {
        let prompt = stage
            .construct_prompt()
            .try_fill(INPUT_PLACEHOLDER, current)?
            .complete()?;
        current = endpoint.complete_chat(vec![user_msg(prompt)?], config, None).await?.text()?;
    }
    Ok(current)
}

fn is_affirmative(reply: &str) -> bool {
    reply.trim_start().to_ascii_lowercase().starts_with("yes")
}

async fn propose_year<E: CompleteChat + Sync>(endpoint: &E,
                                              config: &ConversationConfig,
                                              event: &str) -> Result<Option<String>> {
    let prompt = YEAR_TEMPLATE
        .construct_prompt()
        .fill("event", event)
        .complete()?;
    let reply = endpoint.complete_chat(vec![user_msg(prompt)?], config, None).await?.text()?;
    Ok(extract_year(&reply).map(str::to_string))
}

async fn validate_year<E: CompleteChat + Sync>(endpoint: &E,
                                               config: &ConversationConfig,
                                               event: &str,
                                               year: &str) -> Result<bool> {
    let prompt = VALIDATION_TEMPLATE
        .construct_prompt()
        .fill("event", event)
        .fill("year", year)
        .complete()?;
    let reply = endpoint.complete_chat(vec![user_msg(prompt)?], config, None).await?.text()?;
    Ok(is_affirmative(&reply))
}

/// Generate a year for `event`, validate it with a second call, and retry up to
/// [MAX_ATTEMPTS] times. Returns the accepted 4-digit year, or [FAILURE_SENTINEL] once
/// the attempts are exhausted. Never returns an error.
pub async fn generate_validated_year<E: CompleteChat + Sync>(endpoint: &E,
                                                             config: &ConversationConfig,
                                                             event: &str) -> String {
    for attempt in 1..=MAX_ATTEMPTS {
        let candidate = match propose_year(endpoint, config, event).await {
            Ok(Some(year)) => year,
            Ok(None) => {
                warn!("attempt {}/{}: the reply contained no isolated 4-digit year", attempt, MAX_ATTEMPTS);
                continue;
            }
            Err(error) => {
                warn!("attempt {}/{}: generation failed: {:#}", attempt, MAX_ATTEMPTS, error);
                continue;
            }
        };
        match validate_year(endpoint, config, event, &candidate).await {
            Ok(true) => {
                info!("attempt {}/{}: accepted year {}", attempt, MAX_ATTEMPTS, candidate);
                return candidate;
            }
            Ok(false) => {
                warn!("attempt {}/{}: year {} was rejected by validation", attempt, MAX_ATTEMPTS, candidate);
            }
            Err(error) => {
                warn!("attempt {}/{}: validation failed: {:#}", attempt, MAX_ATTEMPTS, error);
            }
        }
    }
    FAILURE_SENTINEL.to_string()
}

#[cfg(test)]
mod test_chaining {
    use crate::prompt::PromptTemplate;
    use crate::utils::llm::testing::ScriptedEndpoint;
    use crate::utils::llm::ConversationConfig;

    use super::{generate_validated_year, pipe, FAILURE_SENTINEL, MAX_ATTEMPTS};

    #[tokio::test]
    async fn test_pipe_feeds_output_forward() {
        let endpoint = ScriptedEndpoint::with_texts(&["a haiku about rivers", "Rivers carve the stone..."]);
        let config = ConversationConfig::default();
        let stages = vec![
            PromptTemplate::new("Suggest a topic for a poem about {{input}}."),
            PromptTemplate::new("Write {{input}}."),
        ];
        let result = pipe(&endpoint, &config, &stages, "nature").await.unwrap();
        assert_eq!("Rivers carve the stone...", result);
        assert_eq!(2, endpoint.call_count());
    }

    #[tokio::test]
    async fn test_pipe_rejects_stage_without_input_slot() {
        let endpoint = ScriptedEndpoint::with_texts(&[]);
        let config = ConversationConfig::default();
        let stages = vec![PromptTemplate::new("No slot here.")];
        assert!(pipe(&endpoint, &config, &stages, "x").await.is_err());
        assert_eq!(0, endpoint.call_count());
    }

    #[tokio::test]
    async fn test_validated_year_first_attempt() {
        let endpoint = ScriptedEndpoint::with_texts(&["It was 1969.", "Yes, that is right."]);
        let config = ConversationConfig::default();
        let year = generate_validated_year(&endpoint, &config, "the first Moon landing take place").await;
        assert_eq!("1969", year);
        assert_eq!(2, endpoint.call_count());
    }

    #[tokio::test]
    async fn test_validated_year_retries_after_rejection() {
        let endpoint = ScriptedEndpoint::with_texts(&["1971", "no", "The year was 1969.", "yes"]);
        let config = ConversationConfig::default();
        let year = generate_validated_year(&endpoint, &config, "the first Moon landing take place").await;
        assert_eq!("1969", year);
        assert_eq!(4, endpoint.call_count());
    }

    #[tokio::test]
    async fn test_validated_year_gives_up_with_sentinel() {
        let endpoint = ScriptedEndpoint::with_texts(&["no digits", "still none", "nope"]);
        let config = ConversationConfig::default();
        let year = generate_validated_year(&endpoint, &config, "something obscure happen").await;
        assert_eq!(FAILURE_SENTINEL, year);
        // one generation call per attempt, no validation calls
        assert_eq!(MAX_ATTEMPTS, endpoint.call_count());
    }

    #[tokio::test]
    async fn test_validated_year_swallows_endpoint_errors() {
        // an empty script makes every call fail
        let endpoint = ScriptedEndpoint::new(Vec::new());
        let config = ConversationConfig::default();
        let year = generate_validated_year(&endpoint, &config, "anything happen").await;
        assert_eq!(FAILURE_SENTINEL, year);
        assert_eq!(MAX_ATTEMPTS, endpoint.call_count());
    }
}
