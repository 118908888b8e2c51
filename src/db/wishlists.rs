//! Wishlists repository
//!
//! A (user, content) row existing is the whole state; there is no flag column.

use std::collections::HashSet;

use anyhow::Result;
use sqlx::SqlitePool;

use super::contents::ContentSummary;
use super::sqlite_helpers::{in_list_sql, now_iso8601};

pub struct WishlistsRepository {
    pool: SqlitePool,
}

impl WishlistsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Add an entry. A concurrent duplicate insert is ignored.
    pub async fn add(&self, user_id: i64, content_id: i64) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO wishlists (user_id, content_id, created_at)
            VALUES (?, ?, ?)
            ON CONFLICT (user_id, content_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(content_id)
        .bind(now_iso8601())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Remove an entry. Returns whether a row was deleted.
    pub async fn remove(&self, user_id: i64, content_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM wishlists WHERE user_id = ? AND content_id = ?")
            .bind(user_id)
            .bind(content_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn contains(&self, user_id: i64, content_id: i64) -> Result<bool> {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT id FROM wishlists WHERE user_id = ? AND content_id = ?")
                .bind(user_id)
                .bind(content_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.is_some())
    }

    /// Which of `content_ids` the user has wishlisted, in one query.
    pub async fn contained_among(&self, user_id: i64, content_ids: &[i64]) -> Result<HashSet<i64>> {
        if content_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let sql = format!(
            "SELECT content_id FROM wishlists WHERE user_id = ? AND {}",
            in_list_sql("content_id", content_ids.len())
        );
        let mut query = sqlx::query_as::<_, (i64,)>(&sql).bind(user_id);
        for id in content_ids {
            query = query.bind(*id);
        }
        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// The user's wishlisted content, most recently added first.
    pub async fn list_contents(&self, user_id: i64) -> Result<Vec<ContentSummary>> {
        let rows = sqlx::query_as::<_, ContentSummary>(
            r#"
            SELECT c.id, c.title, c.thumbnail_url, c.release_year
            FROM wishlists w
            JOIN contents c ON c.id = w.content_id
            WHERE w.user_id = ?
            ORDER BY w.created_at DESC, w.id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{insert_user, seeded_db};

    #[tokio::test]
    async fn test_add_remove() {
        let db = seeded_db().await;
        let user_id = insert_user(&db, "ada@example.com").await;
        let wishlists = db.wishlists();

        assert!(!wishlists.contains(user_id, 1).await.unwrap());
        wishlists.add(user_id, 1).await.unwrap();
        wishlists.add(user_id, 1).await.unwrap();
        assert!(wishlists.contains(user_id, 1).await.unwrap());

        assert!(wishlists.remove(user_id, 1).await.unwrap());
        assert!(!wishlists.remove(user_id, 1).await.unwrap());
        assert!(!wishlists.contains(user_id, 1).await.unwrap());
    }

    #[tokio::test]
    async fn test_contained_among_and_listing() {
        let db = seeded_db().await;
        let user_id = insert_user(&db, "ada@example.com").await;
        let other_id = insert_user(&db, "bob@example.com").await;
        let wishlists = db.wishlists();

        wishlists.add(user_id, 2).await.unwrap();
        wishlists.add(user_id, 5).await.unwrap();
        wishlists.add(other_id, 3).await.unwrap();

        let found = wishlists.contained_among(user_id, &[1, 2, 3, 5]).await.unwrap();
        assert_eq!(found, HashSet::from([2, 5]));
        assert!(wishlists.contained_among(user_id, &[]).await.unwrap().is_empty());

        let listed: Vec<i64> = wishlists
            .list_contents(user_id)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(listed, vec![5, 2]);
    }

    #[tokio::test]
    async fn test_unknown_content_violates_foreign_key() {
        let db = seeded_db().await;
        let user_id = insert_user(&db, "ada@example.com").await;
        assert!(db.wishlists().add(user_id, 999).await.is_err());
    }
}
