//! Crate-private machinery for discovering and substituting `{{name}}` placeholders.

use std::collections::{HashMap, HashSet};

use lazy_static::lazy_static;
use regex::{Captures, Regex};

lazy_static! {
    pub(crate) static ref PLACEHOLDER_MATCH_RE: Regex = Regex::new(r"\{\{.*?\}\}").unwrap();
}

/// Strips `{{` and `}}` from a matched placeholder, which is algorithmically unsafe.
/// Ensure the string is properly formatted like `{{a}}`.
#[inline]
pub(crate) fn strip_format(key: &str) -> &str {
    &key[2..key.len() - 2]
}

/// Replaces all placeholders with mappings.
///
/// Safety:
/// * Must ensure all keys in the string are in the mapping
/// * Must ensure all entries in the mapping is Some
pub(crate) unsafe fn replace_all_placeholders(original: &str, mapping: &HashMap<String, Option<String>>) -> String {
    let new_string = PLACEHOLDER_MATCH_RE.replace_all(original, |captures: &Captures| {
        let match_text = &captures[0];
        let key = strip_format(match_text);
        let replacement = mapping.get(key).unwrap_unchecked().as_ref().unwrap_unchecked();
        replacement
    });
    new_string.to_string()
}

/// Finds the names of all placeholders in a template string.
pub(crate) fn get_placeholders(string: &str) -> HashSet<String> {
    PLACEHOLDER_MATCH_RE.captures_iter(string)
        .map(|captures| strip_format(&captures[0]).to_string())
        .collect()
}
