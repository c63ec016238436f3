//! Fail-soft parsing of generated JSON arrays.
//!
//! The generation service is asked for a bare JSON array but often wraps it in
//! markdown fences or adds a sentence around it. Parsing never fails: anything
//! that can't be read as a list of items yields an empty list.

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::{flashcard::FlashcardItem, quiz::QuizQuestion};

/// Remove every "```json" and "```" and trim the rest.
pub fn strip_code_fences(raw: &str) -> String {
    raw.replace("```json", "").replace("```", "").trim().to_string()
}

pub fn parse_items<T: DeserializeOwned>(raw: &str) -> Vec<T> {
    let clean = strip_code_fences(raw);
    debug!("Clean response: {}", clean);
    match serde_json::from_str::<Vec<T>>(&clean) {
        Ok(items) => return items,
        Err(e) => debug!("strict parse failed: {}", e),
    }
    // retry on the outermost brackets, e.g. "Here you go: [...]"
    if let (Some(start), Some(end)) = (clean.find('['), clean.rfind(']')) {
        if start < end && (start > 0 || end + 1 < clean.len()) {
            if let Ok(items) = serde_json::from_str::<Vec<T>>(&clean[start..=end]) {
                warn!("recovered {} items from surrounding text", items.len());
                return items;
            }
        }
    }
    warn!("Failed to parse: {}", raw);
    Vec::new()
}

pub fn parse_quiz_response(raw: &str) -> Vec<QuizQuestion> {
    parse_items(raw)
}

pub fn parse_flashcard_response(raw: &str) -> Vec<FlashcardItem> {
    parse_items(raw)
}
