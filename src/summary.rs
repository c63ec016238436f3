use std::time::Duration;

use tracing::{error, info};

use crate::{
    ai_utils::{TextGenerator, generate_with_timeout},
    chapter::ContentSource,
    error::GenerationError,
    prompts::build_summary_prompt,
    quiz::{session::SessionFailure, workflow::load_chapter_content},
};

pub const NO_SUMMARY: &str = "No summary generated";

/// Bullet point summary of `content`.
pub async fn summarize<G: TextGenerator>(
    generator: &G,
    content: &str,
    timeout: Duration,
) -> Result<String, GenerationError> {
    let prompt = build_summary_prompt(content);
    let text = generate_with_timeout(generator, &prompt, timeout).await?;
    let summary = text
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(NO_SUMMARY)
        .to_string();
    info!("summary generated, {} chars", summary.len());
    Ok(summary)
}

pub async fn summarize_chapter<C: ContentSource, G: TextGenerator>(
    source: &C,
    generator: &G,
    chapter_id: i64,
    timeout: Duration,
) -> Result<String, SessionFailure> {
    let content = load_chapter_content(source, chapter_id).await?;
    summarize(generator, &content, timeout).await.map_err(|e| {
        error!("Error generating summary: {}", e);
        SessionFailure {
            message: format!("Failed to generate summary: {e}"),
            retryable: e.is_retryable(),
        }
    })
}
