use std::mem::take;

use tracing::{debug, info};

use super::{
    AnswerSelection, QuizQuestion,
    grading::{self, QuestionResult},
    validate::{ValidationReport, validate_quiz},
};
use crate::{
    config::QuizConfig,
    error::{Error, GenerationError},
    history::AnsweredQuestion,
};

/// Identifies one generation attempt. Results carrying an older ticket are
/// dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GenerationTicket(u64);

impl GenerationTicket {
    pub(crate) fn new(n: u64) -> Self {
        Self(n)
    }
}

/// A user facing failure, shown with a retry button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionFailure {
    pub message: String,
    pub retryable: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum QuizState {
    #[default]
    CountSelection,
    Generating {
        ticket: GenerationTicket,
    },
    Error {
        failure: SessionFailure,
    },
    AnsweringInProgress {
        questions: Vec<QuizQuestion>,
        answers: AnswerSelection,
        report: ValidationReport,
    },
    Submitted {
        questions: Vec<QuizQuestion>,
        answers: AnswerSelection,
        results: Vec<QuestionResult>,
        score: u8,
    },
}

/// What a submit produced, enough to build a history record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizOutcome {
    pub score: u8,
    pub questions: Vec<AnsweredQuestion>,
}

/// One quiz attempt from count selection to result.
#[derive(Debug, Clone)]
pub struct QuizSession {
    bounds: QuizConfig,
    count: usize,
    state: QuizState,
    next_ticket: u64,
}

impl QuizSession {
    pub fn new(bounds: QuizConfig) -> Self {
        Self {
            bounds,
            count: bounds.default_questions,
            state: QuizState::CountSelection,
            next_ticket: 0,
        }
    }

    pub fn state(&self) -> &QuizState {
        &self.state
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn bounds(&self) -> QuizConfig {
        self.bounds
    }

    fn check_count(&self, count: usize) -> Result<(), Error> {
        if self.bounds.contains(count) {
            Ok(())
        } else {
            Err(Error::InvalidCount {
                count,
                min: self.bounds.min_questions,
                max: self.bounds.max_questions,
            })
        }
    }

    /// Pick the number of questions. Only while choosing or after an error,
    /// returns whether the count was taken.
    pub fn select_count(&mut self, count: usize) -> Result<bool, Error> {
        self.check_count(count)?;
        match self.state {
            QuizState::CountSelection | QuizState::Error { .. } => {
                self.count = count;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Enter `Generating`, dropping any questions and answers. Refused while a
    /// generation is already running or the quiz was submitted.
    pub fn begin_generation(&mut self) -> Option<GenerationTicket> {
        match self.state {
            QuizState::Generating { .. } | QuizState::Submitted { .. } => None,
            _ => {
                self.next_ticket += 1;
                let ticket = GenerationTicket::new(self.next_ticket);
                self.state = QuizState::Generating { ticket };
                info!("generating {} questions", self.count);
                Some(ticket)
            }
        }
    }

    /// Regenerate with the same count or a new one.
    pub fn regenerate(&mut self, count: Option<usize>) -> Result<Option<GenerationTicket>, Error> {
        if matches!(
            self.state,
            QuizState::Generating { .. } | QuizState::Submitted { .. }
        ) {
            return Ok(None);
        }
        if let Some(count) = count {
            self.check_count(count)?;
            self.count = count;
        }
        Ok(self.begin_generation())
    }

    /// Apply the result of a generation. Returns false if the ticket is stale,
    /// in which case the session is untouched.
    pub fn finish_generation(
        &mut self,
        ticket: GenerationTicket,
        result: Result<Vec<QuizQuestion>, GenerationError>,
    ) -> bool {
        match self.state {
            QuizState::Generating { ticket: current } if current == ticket => {}
            _ => {
                debug!("discard generation result for {:?}", ticket);
                return false;
            }
        }
        self.state = match result {
            Err(e) => QuizState::Error {
                failure: SessionFailure {
                    message: format!("Failed to generate quiz: {e}"),
                    retryable: e.is_retryable(),
                },
            },
            Ok(questions) if questions.is_empty() => QuizState::Error {
                failure: SessionFailure {
                    message: "No questions generated".to_string(),
                    retryable: true,
                },
            },
            Ok(questions) => {
                info!("Parsed {} questions", questions.len());
                let report = validate_quiz(self.count, &questions);
                QuizState::AnsweringInProgress {
                    questions,
                    answers: AnswerSelection::new(),
                    report,
                }
            }
        };
        true
    }

    /// Abandon a running generation, back to count selection.
    pub fn cancel_generation(&mut self) -> bool {
        if matches!(self.state, QuizState::Generating { .. }) {
            self.state = QuizState::CountSelection;
            true
        } else {
            false
        }
    }

    /// Put a load failure on screen, e.g. when the chapter could not be read.
    pub fn fail(&mut self, failure: SessionFailure) {
        if !matches!(self.state, QuizState::Submitted { .. }) {
            self.state = QuizState::Error { failure };
        }
    }

    pub fn select_answer(&mut self, index: usize, option: impl Into<String>) -> bool {
        match &mut self.state {
            QuizState::AnsweringInProgress {
                questions, answers, ..
            } if index < questions.len() => {
                answers.select(index, option);
                true
            }
            _ => false,
        }
    }

    pub fn questions(&self) -> &[QuizQuestion] {
        match &self.state {
            QuizState::AnsweringInProgress { questions, .. }
            | QuizState::Submitted { questions, .. } => questions,
            _ => &[],
        }
    }

    pub fn answers(&self) -> Option<&AnswerSelection> {
        match &self.state {
            QuizState::AnsweringInProgress { answers, .. }
            | QuizState::Submitted { answers, .. } => Some(answers),
            _ => None,
        }
    }

    pub fn can_submit(&self) -> bool {
        match &self.state {
            QuizState::AnsweringInProgress {
                questions, answers, ..
            } => !questions.is_empty() && answers.len() == questions.len(),
            _ => false,
        }
    }

    /// Grade and freeze the quiz. A no-op returning `None` until every
    /// question has an answer.
    pub fn submit(&mut self) -> Option<QuizOutcome> {
        if !self.can_submit() {
            return None;
        }
        let QuizState::AnsweringInProgress {
            questions, answers, ..
        } = take(&mut self.state)
        else {
            return None;
        };
        let results = grading::grade(&questions, &answers);
        let score = grading::score(&questions, &answers);
        let answered = questions
            .iter()
            .zip(&results)
            .map(|(q, r)| AnsweredQuestion {
                question: q.question.clone(),
                correct_answer: q.correct_answer.clone(),
                user_answer: r.user_answer.clone(),
            })
            .collect();
        info!("quiz submitted, score {}", score);
        self.state = QuizState::Submitted {
            questions,
            answers,
            results,
            score,
        };
        Some(QuizOutcome {
            score,
            questions: answered,
        })
    }

    pub fn score(&self) -> Option<u8> {
        match &self.state {
            QuizState::Submitted { score, .. } => Some(*score),
            _ => None,
        }
    }

    pub fn results(&self) -> Option<&[QuestionResult]> {
        match &self.state {
            QuizState::Submitted { results, .. } => Some(results),
            _ => None,
        }
    }

    /// Start over after a submit.
    pub fn retake(&mut self) -> bool {
        if matches!(self.state, QuizState::Submitted { .. }) {
            self.state = QuizState::CountSelection;
            true
        } else {
            false
        }
    }
}
