//! # promptcraft
//!
//! Prompt-engineering tutorial library for LLM applications in Rust
//!
//! `promptcraft` is a lesson-by-lesson tour of practical prompt engineering against an
//! OpenAI-compatible chat-completions endpoint, reached through a routing service such as
//! OpenRouter. Each lesson is ordinary library code with a runnable binary in the
//! `promptcraft-lessons` workspace member, so everything you read here can be executed,
//! tested and reused.
//!
//! ## Usage
//! Add a dependency in `Cargo.toml`
//! ```toml
//! promptcraft = { git = "https://github.com/promptcraft-rs/promptcraft.git", branch = "main" }
//! ```
//! then put your credentials in the environment (or a `.env` file):
//! ```text
//! OPENROUTER_API_KEY=sk-...
//! OPENROUTER_BASE_URL=https://openrouter.ai/api/v1
//! ```
//!
//! ## Concepts and Design
//! The API follows data-driven design: every step that composes a prompt is explicit and
//! trackable, and the hierarchy stays as flat as possible. Cycle speed is NOT a top priority
//! since an LLM can take trillions of cycles to respond to a request.
//!
//! ### Prompt Template and Placeholder
//!
//! A template of prompts. For example,
//!
//! ```text
//! You are a friendly and helpful assistant. Today is {{date}}.
//! ```
//!
//! Here `{{date}}` is a placeholder, a slot to be filled, which has a name `"date"`.
//! The format of a named placeholder is simply `{{whatever name you like}}`. The name can be
//! any string except those containing line breaks `"\n"` and `"\r\n"`.
//!
//! ### Partial Prompt
//!
//! While a prompt template is a blueprint, a partial prompt is an incomplete construction of
//! the template. A [`PartialPrompt`](crate::prompt::PartialPrompt) comes only from
//! [`PromptTemplate::construct_prompt`](crate::prompt::PromptTemplate::construct_prompt); it
//! records which placeholder gets filled by what value and also the unfilled placeholders.
//! When all placeholders are filled, [`PartialPrompt::complete`](crate::prompt::PartialPrompt::complete)
//! renders the concrete prompt.
//!
//! ### Filler
//!
//! Anything that fills one or more placeholders in a partial prompt: anything implementing
//! [`FillPlaceholders`](crate::filler::FillPlaceholders) and at least one of
//! [`Fill`](crate::filler::Fill), [`FillMut`](crate::filler::FillMut),
//! [`FillWith<CTX>`](crate::filler::FillWith) and [`FillWithMut<CTX>`](crate::filler::FillWithMut).
//! A simple example is [`DateFiller`](crate::filler::DateFiller), which fills a placeholder
//! named `date`.
//!
//! ### Endpoint or LLM
//!
//! The endpoint of the `PromptTemplate -> PartialPrompt -> complete prompt (a String)`
//! pipeline is an LLM, which consumes a prompt and produces a reply. The endpoint seam is
//! the [`CompleteChat`](crate::utils::llm::CompleteChat) trait; the production implementation
//! talks to any OpenAI-compatible chat-completions API. Post-processing of replies lives in
//! [utilities](crate::utils).
//!
//! ### Lessons
//!
//! The tutorials themselves: [`lessons`](crate::lessons) covers single-turn and multi-turn
//! prompting, chain-of-thought, prompt chaining with validated generation, response-length
//! management and structured output via function calling. Each lesson is an ordered
//! collection of prompt templates, fillers and post-processing stages.
//!
//! ## License
//!
//! `promptcraft` will always remain free under Apache license.
//!
//! ## Attribution
//! * `async_openai`: [crate::utils::llm::ConversationConfig] mirrors the request type of this crate.
//! * `tiktoken-rs`: re-exported in [crate::utils::token::tiktoken].

pub mod prompt;
pub mod filler;
pub mod lessons;
pub mod utils;
