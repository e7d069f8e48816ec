//! # Lessons
//!
//! The tutorial series itself. Each submodule is one prompt-engineering technique,
//! implemented as ordinary library code on top of [templates](crate::prompt),
//! [fillers](crate::filler) and the [endpoint seam](crate::utils::llm::CompleteChat);
//! the runnable counterpart of each lesson lives in the `promptcraft-lessons` member.
//!
//! * [basics] — single-turn templated requests and multi-turn sessions
//! * [chain_of_thought] — asking for intermediate reasoning before the answer
//! * [chaining] — feeding one prompt's output into the next, and validated generation
//!   with a bounded retry loop
//! * [length] — keeping prompts and replies inside token budgets
//! * [structured] — structured output via function calling

pub mod basics;
pub mod chain_of_thought;
pub mod chaining;
pub mod length;
pub mod structured;
