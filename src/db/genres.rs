//! Genres repository

use std::collections::HashMap;

use anyhow::Result;
use serde::Serialize;
use sqlx::SqlitePool;
use utoipa::ToSchema;

use super::sqlite_helpers::in_list_sql;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow, ToSchema)]
pub struct GenreRecord {
    pub id: i64,
    pub name: String,
    pub description: String,
}

pub struct GenresRepository {
    pool: SqlitePool,
}

impl GenresRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// All genres ordered by name
    pub async fn list_all(&self) -> Result<Vec<GenreRecord>> {
        let rows = sqlx::query_as::<_, GenreRecord>(
            "SELECT id, name, description FROM genres ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Genres attached to one content item, ordered by name
    pub async fn list_for_content(&self, content_id: i64) -> Result<Vec<GenreRecord>> {
        let rows = sqlx::query_as::<_, GenreRecord>(
            r#"
            SELECT g.id, g.name, g.description
            FROM genres g
            JOIN content_genres cg ON cg.genre_id = g.id
            WHERE cg.content_id = ?
            ORDER BY g.name
            "#,
        )
        .bind(content_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Genre names for many content items in one query, keyed by content id.
    ///
    /// Content without genres has no entry in the map.
    pub async fn names_for_contents(&self, content_ids: &[i64]) -> Result<HashMap<i64, Vec<String>>> {
        if content_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let sql = format!(
            r#"
            SELECT cg.content_id, g.name
            FROM content_genres cg
            JOIN genres g ON g.id = cg.genre_id
            WHERE {}
            ORDER BY cg.content_id, g.name
            "#,
            in_list_sql("cg.content_id", content_ids.len())
        );

        let mut query = sqlx::query_as::<_, (i64, String)>(&sql);
        for id in content_ids {
            query = query.bind(*id);
        }
        let rows = query.fetch_all(&self.pool).await?;

        let mut names: HashMap<i64, Vec<String>> = HashMap::new();
        for (content_id, name) in rows {
            names.entry(content_id).or_default().push(name);
        }
        Ok(names)
    }
}
