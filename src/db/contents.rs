//! Contents repository: the read-only video catalog

use anyhow::Result;
use serde::Serialize;
use sqlx::query::QueryAs;
use sqlx::sqlite::SqliteArguments;
use sqlx::{Sqlite, SqlitePool};

use super::sqlite_helpers::escape_like;

/// Full catalog row
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ContentRecord {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub thumbnail_url: String,
    pub video_url: String,
    pub duration: i64,
    pub release_year: i64,
}

/// Columns needed to render a list entry
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ContentSummary {
    pub id: i64,
    pub title: String,
    pub thumbnail_url: String,
    pub release_year: i64,
}

/// Which slice of the catalog a listing covers
#[derive(Debug, Clone, Copy)]
pub enum ContentFilter<'a> {
    All,
    /// Case-insensitive substring match on the title
    TitleContains(&'a str),
    Genre(i64),
}

impl ContentFilter<'_> {
    fn from_and_where(&self) -> &'static str {
        match self {
            ContentFilter::All => "FROM contents c",
            ContentFilter::TitleContains(_) => "FROM contents c WHERE c.title LIKE ? ESCAPE '\\'",
            ContentFilter::Genre(_) => {
                "FROM contents c JOIN content_genres cg ON cg.content_id = c.id WHERE cg.genre_id = ?"
            }
        }
    }

    /// Bind the filter's parameter (if any) onto a query built from `from_and_where`.
    fn bind_to<'q, O>(
        self,
        query: QueryAs<'q, Sqlite, O, SqliteArguments<'q>>,
    ) -> QueryAs<'q, Sqlite, O, SqliteArguments<'q>> {
        match self {
            ContentFilter::All => query,
            ContentFilter::TitleContains(q) => query.bind(format!("%{}%", escape_like(q))),
            ContentFilter::Genre(genre_id) => query.bind(genre_id),
        }
    }
}

pub struct ContentsRepository {
    pool: SqlitePool,
}

impl ContentsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Total rows matching `filter`
    pub async fn count(&self, filter: ContentFilter<'_>) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) {}", filter.from_and_where());
        let query = sqlx::query_as::<_, (i64,)>(&sql);
        let (count,) = filter.bind_to(query).fetch_one(&self.pool).await?;
        Ok(count)
    }

    /// One page of `filter`, newest release first, then by title.
    pub async fn list_page(
        &self,
        filter: ContentFilter<'_>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ContentSummary>> {
        let sql = format!(
            "SELECT c.id, c.title, c.thumbnail_url, c.release_year {} \
             ORDER BY c.release_year DESC, c.title ASC LIMIT ? OFFSET ?",
            filter.from_and_where()
        );
        let query = sqlx::query_as::<_, ContentSummary>(&sql);
        let rows = filter.bind_to(query)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<ContentRecord>> {
        let row = sqlx::query_as::<_, ContentRecord>(
            r#"
            SELECT id, title, description, thumbnail_url, video_url, duration, release_year
            FROM contents WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn exists(&self, id: i64) -> Result<bool> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM contents WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::seeded_db;
    use pretty_assertions::assert_eq;

    fn titles(rows: &[ContentSummary]) -> Vec<&str> {
        rows.iter().map(|r| r.title.as_str()).collect()
    }

    #[tokio::test]
    async fn test_list_ordering() {
        let contents = seeded_db().await.contents();

        let page = contents.list_page(ContentFilter::All, 4, 0).await.unwrap();
        assert_eq!(
            titles(&page),
            vec!["Ocean Deep", "The Last Orbit", "Zero Hour", "Midnight Heist"]
        );

        let rest = contents.list_page(ContentFilter::All, 10, 4).await.unwrap();
        assert_eq!(
            titles(&rest),
            vec!["Kitchen Wars", "Laugh Track", "Signal Lost", "Quiet Harbor"]
        );
        assert_eq!(contents.count(ContentFilter::All).await.unwrap(), 8);
    }

    #[tokio::test]
    async fn test_title_search_is_case_insensitive_and_literal() {
        let contents = seeded_db().await.contents();

        let filter = ContentFilter::TitleContains("ORBIT");
        assert_eq!(contents.count(filter).await.unwrap(), 1);
        let rows = contents.list_page(filter, 10, 0).await.unwrap();
        assert_eq!(titles(&rows), vec!["The Last Orbit"]);

        // Wildcards in user input match literally
        assert_eq!(contents.count(ContentFilter::TitleContains("%")).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_genre_filter() {
        let contents = seeded_db().await.contents();

        let rows = contents.list_page(ContentFilter::Genre(1), 10, 0).await.unwrap();
        assert_eq!(titles(&rows), vec!["Zero Hour", "Midnight Heist", "Signal Lost"]);
        assert_eq!(contents.count(ContentFilter::Genre(1)).await.unwrap(), 3);
        assert_eq!(contents.count(ContentFilter::Genre(404)).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_get_by_id() {
        let contents = seeded_db().await.contents();

        let content = contents.get_by_id(1).await.unwrap().unwrap();
        assert_eq!(content.title, "The Last Orbit");
        assert_eq!(content.duration, 5400);
        assert!(contents.exists(1).await.unwrap());
        assert!(contents.get_by_id(999).await.unwrap().is_none());
        assert!(!contents.exists(999).await.unwrap());
    }
}
