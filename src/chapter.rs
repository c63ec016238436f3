use std::future::Future;

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use time::OffsetDateTime;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Chapter {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Where chapter text comes from. `Ok(None)` means the chapter does not exist.
pub trait ContentSource: Send + Sync {
    fn get(
        &self,
        chapter_id: i64,
    ) -> impl Future<Output = anyhow::Result<Option<Chapter>>> + Send;
}

#[derive(Debug, Clone)]
pub struct ChapterStore {
    database: SqlitePool,
}

impl ChapterStore {
    pub fn new(database: SqlitePool) -> Self {
        Self { database }
    }

    pub async fn add(
        &self,
        title: &str,
        description: &str,
        content: &str,
    ) -> anyhow::Result<i64> {
        let now = OffsetDateTime::now_utc();
        let id = sqlx::query(
            "insert into chapter (title, description, content, created_at) values (?, ?, ?, ?)",
        )
        .bind(title)
        .bind(description)
        .bind(content)
        .bind(now)
        .execute(&self.database)
        .await?
        .last_insert_rowid();
        info!("add chapter {}-{}", id, title);
        Ok(id)
    }

    /// All chapters, newest first.
    pub async fn list(&self) -> anyhow::Result<Vec<Chapter>> {
        let chapters = sqlx::query_as::<_, Chapter>(
            "select id, title, description, content, created_at from chapter \
             order by unixepoch(created_at, 'subsec') desc, id desc",
        )
        .fetch_all(&self.database)
        .await?;
        Ok(chapters)
    }

    /// Chapters whose title or description contains `query`, ignoring case,
    /// newest first. An empty query matches everything.
    pub async fn search(&self, query: &str) -> anyhow::Result<Vec<Chapter>> {
        let chapters = self.list().await?;
        if query.is_empty() {
            return Ok(chapters);
        }
        let query = query.to_lowercase();
        Ok(chapters
            .into_iter()
            .filter(|chapter| {
                chapter.title.to_lowercase().contains(&query)
                    || chapter.description.to_lowercase().contains(&query)
            })
            .collect())
    }

    pub async fn delete(&self, id: i64) -> anyhow::Result<bool> {
        let affected = sqlx::query("delete from chapter where id = ?")
            .bind(id)
            .execute(&self.database)
            .await?
            .rows_affected();
        Ok(affected > 0)
    }
}

impl ContentSource for ChapterStore {
    async fn get(&self, chapter_id: i64) -> anyhow::Result<Option<Chapter>> {
        let chapter = sqlx::query_as::<_, Chapter>(
            "select id, title, description, content, created_at from chapter where id = ?",
        )
        .bind(chapter_id)
        .fetch_optional(&self.database)
        .await?;
        Ok(chapter)
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;
    use crate::utils::memory_database;

    #[tokio::test]
    async fn add_get_list_delete() {
        let store = ChapterStore::new(memory_database().await.unwrap());
        let first = store
            .add("Plants", "biology", "Photosynthesis converts light to energy.")
            .await
            .unwrap();
        let second = store.add("Cells", "", "Cells are small.").await.unwrap();

        let chapter = store.get(first).await.unwrap().unwrap();
        assert_eq!(chapter.title, "Plants");
        assert_eq!(chapter.content, "Photosynthesis converts light to energy.");

        let list = store.list().await.unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].id, second);

        assert!(store.delete(first).await.unwrap());
        assert!(!store.delete(first).await.unwrap());
        assert!(store.get(first).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn search_title_and_description() {
        let store = ChapterStore::new(memory_database().await.unwrap());
        let plants = store
            .add("Photosynthesis", "Plant biology", "Light to energy.")
            .await
            .unwrap();
        let cells = store.add("Cells", "The unit of ÉTUDE", "Cells are small.").await.unwrap();

        let hits = store.search("PHOTO").await.unwrap();
        assert_eq!(hits.iter().map(|c| c.id).collect::<Vec<_>>(), vec![plants]);

        let hits = store.search("biology").await.unwrap();
        assert_eq!(hits.iter().map(|c| c.id).collect::<Vec<_>>(), vec![plants]);

        let hits = store.search("étude").await.unwrap();
        assert_eq!(hits.iter().map(|c| c.id).collect::<Vec<_>>(), vec![cells]);

        assert!(store.search("mitochondria").await.unwrap().is_empty());
        assert_eq!(store.search("").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn list_orders_by_instant_not_text() {
        let store = ChapterStore::new(memory_database().await.unwrap());
        let mut ids = Vec::new();
        for created_at in [
            datetime!(2026-01-01 12:00:00 UTC),
            datetime!(2026-01-01 12:00:00.5 UTC),
        ] {
            let id = sqlx::query(
                "insert into chapter (title, description, content, created_at) values ('t', '', 'c', ?)",
            )
            .bind(created_at)
            .execute(&store.database)
            .await
            .unwrap()
            .last_insert_rowid();
            ids.push(id);
        }
        let list = store.list().await.unwrap();
        assert_eq!(list.iter().map(|c| c.id).collect::<Vec<_>>(), vec![ids[1], ids[0]]);
    }
}
