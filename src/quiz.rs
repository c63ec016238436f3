pub mod grading;
pub mod session;
pub mod validate;
pub mod workflow;

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One multiple-choice question as produced by the generation service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    /// The question text
    pub question: String,
    /// Exactly four answer options
    pub options: Vec<String>,
    /// The correct option, copied verbatim from `options`
    pub correct_answer: String,
}

/// Selected option per question index. Selecting twice for the same index
/// keeps only the last choice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerSelection(BTreeMap<usize, String>);

impl AnswerSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(&mut self, index: usize, option: impl Into<String>) {
        self.0.insert(index, option.into());
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(&index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(usize, S)> for AnswerSelection {
    fn from_iter<I: IntoIterator<Item = (usize, S)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(i, s)| (i, s.into())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answer_overwrite_keeps_last() {
        let mut answers = AnswerSelection::new();
        answers.select(2, "A");
        answers.select(2, "B");
        assert_eq!(answers.len(), 1);
        assert_eq!(answers.get(2), Some("B"));
    }

    #[test]
    fn question_wire_format() {
        let q: QuizQuestion = serde_json::from_str(
            r#"{"question":"2+2?","options":["1","2","3","4"],"correctAnswer":"4"}"#,
        )
        .unwrap();
        assert_eq!(q.correct_answer, "4");
        let json = serde_json::to_string(&q).unwrap();
        assert!(json.contains("\"correctAnswer\":\"4\""));
    }

    #[test]
    fn missing_field_is_rejected() {
        let q = serde_json::from_str::<QuizQuestion>(r#"{"question":"2+2?","options":[]}"#);
        assert!(q.is_err());
    }
}
