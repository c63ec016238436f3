use std::{sync::Arc, time::Duration};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::{
    ai_utils::{TextGenerator, generate_with_timeout},
    chapter::ContentSource,
    parser::parse_flashcard_response,
    prompts::build_flashcard_prompt,
    quiz::session::{GenerationTicket, SessionFailure},
    quiz::workflow::load_chapter_content,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FlashcardItem {
    /// A short, clear term or concept
    pub term: String,
    /// A concise explanation of the term
    pub definition: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeckState {
    /// Nothing requested yet, or the chapter text is still loading
    Idle,
    Generating {
        ticket: GenerationTicket,
    },
    Error {
        failure: SessionFailure,
    },
    Ready {
        cards: Vec<FlashcardItem>,
        current: usize,
        flipped: bool,
    },
}

/// Flashcards for one chapter: generation, then browsing one card at a time.
#[derive(Debug, Clone)]
pub struct FlashcardDeck {
    state: DeckState,
    next_ticket: u64,
}

impl Default for FlashcardDeck {
    fn default() -> Self {
        Self::new()
    }
}

impl FlashcardDeck {
    pub fn new() -> Self {
        Self {
            state: DeckState::Idle,
            next_ticket: 0,
        }
    }

    pub fn state(&self) -> &DeckState {
        &self.state
    }

    /// Regenerating is allowed at any time except while a generation runs.
    pub fn begin_generation(&mut self) -> Option<GenerationTicket> {
        if matches!(self.state, DeckState::Generating { .. }) {
            return None;
        }
        self.next_ticket += 1;
        let ticket = GenerationTicket::new(self.next_ticket);
        self.state = DeckState::Generating { ticket };
        Some(ticket)
    }

    pub fn finish_generation(
        &mut self,
        ticket: GenerationTicket,
        result: Result<Vec<FlashcardItem>, crate::error::GenerationError>,
    ) -> bool {
        if self.state != (DeckState::Generating { ticket }) {
            return false;
        }
        self.state = match result {
            Err(e) => DeckState::Error {
                failure: SessionFailure {
                    message: format!("Failed to generate flashcards: {e}"),
                    retryable: e.is_retryable(),
                },
            },
            Ok(cards) if cards.is_empty() => DeckState::Error {
                failure: SessionFailure {
                    message: "No flashcards generated".to_string(),
                    retryable: true,
                },
            },
            Ok(cards) => {
                info!("Parsed {} flashcards", cards.len());
                DeckState::Ready {
                    cards,
                    current: 0,
                    flipped: false,
                }
            }
        };
        true
    }

    pub fn cancel_generation(&mut self) -> bool {
        if matches!(self.state, DeckState::Generating { .. }) {
            self.state = DeckState::Idle;
            true
        } else {
            false
        }
    }

    pub fn fail(&mut self, failure: SessionFailure) {
        self.state = DeckState::Error { failure };
    }

    pub fn cards(&self) -> &[FlashcardItem] {
        match &self.state {
            DeckState::Ready { cards, .. } => cards,
            _ => &[],
        }
    }

    pub fn current(&self) -> Option<(usize, &FlashcardItem, bool)> {
        match &self.state {
            DeckState::Ready {
                cards,
                current,
                flipped,
            } => cards.get(*current).map(|card| (*current, card, *flipped)),
            _ => None,
        }
    }

    pub fn flip(&mut self) {
        if let DeckState::Ready { flipped, .. } = &mut self.state {
            *flipped = !*flipped;
        }
    }

    /// Move to the next card, stays on the last one.
    pub fn next(&mut self) -> bool {
        if let DeckState::Ready {
            cards,
            current,
            flipped,
        } = &mut self.state
        {
            if *current + 1 < cards.len() {
                *current += 1;
                *flipped = false;
                return true;
            }
        }
        false
    }

    pub fn previous(&mut self) -> bool {
        if let DeckState::Ready {
            current, flipped, ..
        } = &mut self.state
        {
            if *current > 0 {
                *current -= 1;
                *flipped = false;
                return true;
            }
        }
        false
    }
}

/// Drives a [`FlashcardDeck`] for one chapter.
pub struct FlashcardWorkflow<C, G> {
    chapter_id: i64,
    content: Option<Arc<str>>,
    deck: FlashcardDeck,
    source: Arc<C>,
    generator: Arc<G>,
    timeout: Duration,
}

impl<C: ContentSource, G: TextGenerator> FlashcardWorkflow<C, G> {
    pub fn new(chapter_id: i64, source: Arc<C>, generator: Arc<G>, timeout: Duration) -> Self {
        Self {
            chapter_id,
            content: None,
            deck: FlashcardDeck::new(),
            source,
            generator,
            timeout,
        }
    }

    pub fn deck(&self) -> &FlashcardDeck {
        &self.deck
    }

    pub fn deck_mut(&mut self) -> &mut FlashcardDeck {
        &mut self.deck
    }

    /// Load the chapter if needed, then generate. The outcome ends up in the
    /// deck state.
    pub async fn generate(&mut self) -> &DeckState {
        let content = match self.content.clone() {
            Some(content) => content,
            None => match load_chapter_content(self.source.as_ref(), self.chapter_id).await {
                Ok(content) => {
                    self.content = Some(content.clone());
                    content
                }
                Err(failure) => {
                    self.deck.fail(failure);
                    return self.deck.state();
                }
            },
        };
        let Some(ticket) = self.deck.begin_generation() else {
            return self.deck.state();
        };
        let prompt = build_flashcard_prompt(&content);
        let result = generate_with_timeout(self.generator.as_ref(), &prompt, self.timeout)
            .await
            .map(|text| parse_flashcard_response(text.as_deref().unwrap_or_default()));
        if let Err(e) = &result {
            error!("Flashcard generation error: {}", e);
        }
        self.deck.finish_generation(ticket, result);
        self.deck.state()
    }
}
