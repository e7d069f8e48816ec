//! Fillers: anything that fills one or more placeholders in a [PartialPrompt].
//!
//! A filler can also be a composition of many fillers, so in a complex workflow a
//! [PartialPrompt] can be filled in multiple stages before it is completed.

use anyhow::Result;
use chrono::Local;

use crate::prompt::PartialPrompt;

pub trait FillPlaceholders {
    fn placeholders_to_fill(&self) -> &Vec<String>;
}

pub trait Fill: FillPlaceholders {
    fn fill(&self, partial_prompt: &mut PartialPrompt) -> Result<()>;
}

pub trait FillMut: FillPlaceholders {
    fn fill_mut(&mut self, partial_prompt: &mut PartialPrompt) -> Result<()>;
}

pub trait FillWith<CTX>: FillPlaceholders {
    fn fill_with(&self, partial_prompt: &mut PartialPrompt, context: CTX) -> Result<CTX>;
}

pub trait FillWithMut<CTX>: FillPlaceholders {
    fn fill_with_mut(&mut self, partial_prompt: &mut PartialPrompt, context: CTX) -> Result<CTX>;
}

impl<T: FillWith<()>> Fill for T {
    fn fill(&self, partial_prompt: &mut PartialPrompt) -> Result<()> {
        self.fill_with(partial_prompt, ()).map(|_| ())
    }
}

impl<T: FillWithMut<()>> FillMut for T {
    fn fill_mut(&mut self, partial_prompt: &mut PartialPrompt) -> Result<()> {
        self.fill_with_mut(partial_prompt, ()).map(|_| ())
    }
}

/// Fills a `{{date}}` placeholder with the current local date in ISO 8601 format.
///
/// The canonical example filler: system prompts like
/// `"You are a friendly and helpful assistant. Today is {{date}}."` stay templates until the
/// moment of the request.
pub struct DateFiller {
    placeholders_to_fill: Vec<String>,
}

impl DateFiller {
    pub const DATE_PLACEHOLDER: &'static str = "date";

    pub fn new() -> Self {
        Self {
            placeholders_to_fill: vec![Self::DATE_PLACEHOLDER.to_string()],
        }
    }
}

impl Default for DateFiller {
    fn default() -> Self {
        Self::new()
    }
}

impl FillPlaceholders for DateFiller {
    fn placeholders_to_fill(&self) -> &Vec<String> {
        &self.placeholders_to_fill
    }
}

impl Fill for DateFiller {
    fn fill(&self, partial_prompt: &mut PartialPrompt) -> Result<()> {
        let today = Local::now().date_naive().format("%Y-%m-%d").to_string();
        partial_prompt.try_fill(Self::DATE_PLACEHOLDER, today)?;
        Ok(())
    }
}

#[cfg(test)]
mod test_filler {
    use crate::prompt::PromptTemplate;

    use super::{DateFiller, Fill, FillPlaceholders};

    #[test]
    fn test_date_filler() {
        let template = PromptTemplate::new("Today is {{date}}.");
        let mut partial_prompt = template.construct_prompt();
        let filler = DateFiller::new();
        assert_eq!(&vec!["date".to_string()], filler.placeholders_to_fill());
        filler.fill(&mut partial_prompt).unwrap();
        let prompt = partial_prompt.complete().unwrap();
        assert!(prompt.starts_with("Today is "));
        assert!(!prompt.contains("{{date}}"));
    }

    #[test]
    fn test_date_filler_without_date_placeholder() {
        let template = PromptTemplate::new("Hello, {{name}}!");
        let mut partial_prompt = template.construct_prompt();
        let filler = DateFiller::new();
        assert!(filler.fill(&mut partial_prompt).is_err());
    }
}
