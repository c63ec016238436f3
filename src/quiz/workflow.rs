use std::{sync::Arc, time::Duration};

use time::OffsetDateTime;
use tokio::task::JoinHandle;
use tracing::{error, info};

use super::session::{GenerationTicket, QuizOutcome, QuizSession, QuizState, SessionFailure};
use crate::{
    ai_utils::{TextGenerator, generate_with_timeout},
    chapter::ContentSource,
    config::QuizConfig,
    error::Error,
    history::{HistoryRecorder, QuizAttempt, record_best_effort},
    parser::parse_quiz_response,
    prompts::build_quiz_prompt,
};

/// Fetch a chapter's text. Missing chapters and store failures both come back
/// as a retryable "Failed to load chapter content" failure.
pub async fn load_chapter_content<C: ContentSource>(
    source: &C,
    chapter_id: i64,
) -> Result<Arc<str>, SessionFailure> {
    let result = match source.get(chapter_id).await {
        Ok(Some(chapter)) => Ok(chapter.content),
        Ok(None) => Err(anyhow::Error::from(Error::ChapterNotFound(chapter_id))),
        Err(e) => Err(e),
    };
    result.map(Arc::<str>::from).map_err(|e| {
        error!("Error loading chapter content: {:?}", e);
        SessionFailure {
            message: format!("Failed to load chapter content: {e}"),
            retryable: true,
        }
    })
}

/// A submitted quiz together with its background history write.
pub struct Submission {
    pub outcome: QuizOutcome,
    pub history: JoinHandle<Option<i64>>,
}

/// Drives a [`QuizSession`] for one chapter: loads the text once, talks to the
/// generator and records graded attempts.
pub struct QuizWorkflow<C, G, H> {
    chapter_id: i64,
    content: Option<Arc<str>>,
    session: QuizSession,
    source: Arc<C>,
    generator: Arc<G>,
    history: Arc<H>,
    timeout: Duration,
}

impl<C, G, H> QuizWorkflow<C, G, H>
where
    C: ContentSource,
    G: TextGenerator,
    H: HistoryRecorder + 'static,
{
    pub fn new(
        chapter_id: i64,
        bounds: QuizConfig,
        source: Arc<C>,
        generator: Arc<G>,
        history: Arc<H>,
        timeout: Duration,
    ) -> Self {
        Self {
            chapter_id,
            content: None,
            session: QuizSession::new(bounds),
            source,
            generator,
            history,
            timeout,
        }
    }

    pub fn chapter_id(&self) -> i64 {
        self.chapter_id
    }

    pub fn session(&self) -> &QuizSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut QuizSession {
        &mut self.session
    }

    /// Fetch the chapter text unless it is already cached. A failure is put
    /// into the session as an error state.
    pub async fn load_content(&mut self) -> Option<Arc<str>> {
        if let Some(content) = self.content.clone() {
            return Some(content);
        }
        match load_chapter_content(self.source.as_ref(), self.chapter_id).await {
            Ok(content) => {
                self.content = Some(content.clone());
                Some(content)
            }
            Err(failure) => {
                self.session.fail(failure);
                None
            }
        }
    }

    /// Generate questions for the current count. Also used for retry.
    ///
    /// If this future is dropped midway the session stays in `Generating`;
    /// call [`QuizWorkflow::cancel`] to get back to count selection.
    pub async fn generate(&mut self) -> &QuizState {
        let Some(content) = self.load_content().await else {
            return self.session.state();
        };
        if let Some(ticket) = self.session.begin_generation() {
            self.run(ticket, &content).await;
        }
        self.session.state()
    }

    /// Throw away the current questions and answers and generate again,
    /// optionally with a new count.
    pub async fn regenerate(&mut self, count: Option<usize>) -> Result<&QuizState, Error> {
        let Some(content) = self.load_content().await else {
            return Ok(self.session.state());
        };
        if let Some(ticket) = self.session.regenerate(count)? {
            self.run(ticket, &content).await;
        }
        Ok(self.session.state())
    }

    async fn run(&mut self, ticket: GenerationTicket, content: &str) {
        let prompt = build_quiz_prompt(content, self.session.count());
        let result = generate_with_timeout(self.generator.as_ref(), &prompt, self.timeout)
            .await
            .map(|text| parse_quiz_response(text.as_deref().unwrap_or_default()));
        if let Err(e) = &result {
            error!("Quiz generation error: {}", e);
        }
        self.session.finish_generation(ticket, result);
    }

    pub fn cancel(&mut self) -> bool {
        self.session.cancel_generation()
    }

    pub fn select_answer(&mut self, index: usize, option: impl Into<String>) -> bool {
        self.session.select_answer(index, option)
    }

    /// Grade the quiz and record it in the background. Returns `None`, and
    /// changes nothing, while some question is unanswered.
    pub fn submit(&mut self) -> Option<Submission> {
        let outcome = self.session.submit()?;
        let attempt = QuizAttempt {
            chapter_id: self.chapter_id,
            score: outcome.score,
            date: OffsetDateTime::now_utc(),
            questions: outcome.questions.clone(),
        };
        info!("chapter {} quiz score {}", self.chapter_id, outcome.score);
        let history = record_best_effort(self.history.clone(), attempt);
        Some(Submission { outcome, history })
    }

    pub fn retake(&mut self) -> bool {
        self.session.retake()
    }
}
