use std::future::Future;

use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};
use time::OffsetDateTime;
use tracing::{error, info};

pub const UNKNOWN_CHAPTER: &str = "Unknown Chapter";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnsweredQuestion {
    pub question: String,
    pub correct_answer: String,
    pub user_answer: Option<String>,
}

/// A graded attempt, ready to be recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizAttempt {
    pub chapter_id: i64,
    pub score: u8,
    pub date: OffsetDateTime,
    pub questions: Vec<AnsweredQuestion>,
}

/// Row of the history list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizHistoryEntry {
    pub id: i64,
    pub chapter_id: i64,
    pub chapter_title: String,
    pub score: u8,
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
}

/// A stored attempt with its questions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizHistoryRecord {
    #[serde(flatten)]
    pub entry: QuizHistoryEntry,
    pub questions: Vec<AnsweredQuestion>,
}

/// Persists graded attempts, returns the new record id.
pub trait HistoryRecorder: Send + Sync {
    fn add(&self, attempt: QuizAttempt) -> impl Future<Output = anyhow::Result<i64>> + Send;
}

/// Write `attempt` in the background. Failures are logged and otherwise
/// ignored; the returned handle resolves to the new id if the write landed.
pub fn record_best_effort<H>(
    recorder: std::sync::Arc<H>,
    attempt: QuizAttempt,
) -> tokio::task::JoinHandle<Option<i64>>
where
    H: HistoryRecorder + 'static,
{
    tokio::spawn(async move {
        match recorder.add(attempt).await {
            Ok(id) => {
                info!("Quiz results saved successfully: {}", id);
                Some(id)
            }
            Err(e) => {
                error!("Error saving quiz results: {:?}", e);
                None
            }
        }
    })
}

#[derive(Debug, Clone)]
pub struct HistoryStore {
    database: SqlitePool,
}

impl HistoryStore {
    pub fn new(database: SqlitePool) -> Self {
        Self { database }
    }

    /// Every attempt, newest first.
    pub async fn list(&self) -> anyhow::Result<Vec<QuizHistoryEntry>> {
        let rows = sqlx::query(
            "select h.id, h.chapter_id, c.title, h.score, h.created_at from quiz_history h \
             left join chapter c on c.id = h.chapter_id \
             order by unixepoch(h.created_at, 'subsec') desc, h.id desc",
        )
        .fetch_all(&self.database)
        .await?;
        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            entries.push(entry_from_row(&row)?);
        }
        Ok(entries)
    }

    pub async fn get(&self, id: i64) -> anyhow::Result<Option<QuizHistoryRecord>> {
        let Some(row) = sqlx::query(
            "select h.id, h.chapter_id, c.title, h.score, h.created_at, h.questions from quiz_history h \
             left join chapter c on c.id = h.chapter_id where h.id = ?",
        )
        .bind(id)
        .fetch_optional(&self.database)
        .await?
        else {
            return Ok(None);
        };
        let entry = entry_from_row(&row)?;
        let questions: String = row.try_get("questions")?;
        let questions = serde_json::from_str::<Vec<AnsweredQuestion>>(&questions)?;
        Ok(Some(QuizHistoryRecord { entry, questions }))
    }

    pub async fn delete(&self, id: i64) -> anyhow::Result<bool> {
        let affected = sqlx::query("delete from quiz_history where id = ?")
            .bind(id)
            .execute(&self.database)
            .await?
            .rows_affected();
        Ok(affected > 0)
    }
}

fn entry_from_row(row: &sqlx::sqlite::SqliteRow) -> anyhow::Result<QuizHistoryEntry> {
    let title: Option<String> = row.try_get("title")?;
    let score: i64 = row.try_get("score")?;
    Ok(QuizHistoryEntry {
        id: row.try_get("id")?,
        chapter_id: row.try_get("chapter_id")?,
        chapter_title: title.unwrap_or_else(|| UNKNOWN_CHAPTER.to_string()),
        score: u8::try_from(score)?,
        date: row.try_get("created_at")?,
    })
}

impl HistoryRecorder for HistoryStore {
    async fn add(&self, attempt: QuizAttempt) -> anyhow::Result<i64> {
        let questions = serde_json::to_string(&attempt.questions)?;
        let id = sqlx::query(
            "insert into quiz_history (chapter_id, score, questions, created_at) values (?, ?, ?, ?)",
        )
        .bind(attempt.chapter_id)
        .bind(i64::from(attempt.score))
        .bind(questions)
        .bind(attempt.date)
        .execute(&self.database)
        .await?
        .last_insert_rowid();
        Ok(id)
    }
}
