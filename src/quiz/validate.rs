use std::collections::HashSet;

use serde::Serialize;
use tracing::warn;

use super::QuizQuestion;

pub const EXPECTED_OPTIONS: usize = 4;

/// Something odd about a generated quiz. Issues are flagged for review, the
/// quiz is still playable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ValidationIssue {
    CountMismatch { requested: usize, received: usize },
    OptionCount { index: usize, count: usize },
    DuplicateOptions { index: usize },
    AnswerNotInOptions { index: usize },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

pub fn validate_quiz(requested: usize, questions: &[QuizQuestion]) -> ValidationReport {
    let mut issues = Vec::new();
    if questions.len() != requested {
        issues.push(ValidationIssue::CountMismatch {
            requested,
            received: questions.len(),
        });
    }
    for (index, question) in questions.iter().enumerate() {
        if question.options.len() != EXPECTED_OPTIONS {
            issues.push(ValidationIssue::OptionCount {
                index,
                count: question.options.len(),
            });
        }
        let distinct: HashSet<&str> = question.options.iter().map(String::as_str).collect();
        if distinct.len() != question.options.len() {
            issues.push(ValidationIssue::DuplicateOptions { index });
        }
        if !question.options.contains(&question.correct_answer) {
            issues.push(ValidationIssue::AnswerNotInOptions { index });
        }
    }
    for issue in &issues {
        warn!("generated quiz flagged: {:?}", issue);
    }
    ValidationReport { issues }
}
