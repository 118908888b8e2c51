//! Viewing history repository
//!
//! One row per (user, content) holding the latest playback state. Writes are
//! single statements keyed on that pair, so concurrent writers race and the
//! later one wins.

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use super::sqlite_helpers::{bool_to_int, int_to_bool, now_iso8601, str_to_datetime};

/// History row joined with the content it refers to
#[derive(Debug, Clone)]
pub struct HistoryEntryRecord {
    pub id: i64,
    pub content_id: i64,
    pub watch_duration: i64,
    pub last_position: i64,
    pub watched_at: DateTime<Utc>,
    pub is_completed: bool,
    pub title: String,
    pub thumbnail_url: String,
    pub duration: i64,
}

impl sqlx::FromRow<'_, sqlx::sqlite::SqliteRow> for HistoryEntryRecord {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> sqlx::Result<Self> {
        use sqlx::Row;

        let watched_at_str: String = row.try_get("watched_at")?;
        let is_completed_int: i32 = row.try_get("is_completed")?;

        Ok(Self {
            id: row.try_get("id")?,
            content_id: row.try_get("content_id")?,
            watch_duration: row.try_get("watch_duration")?,
            last_position: row.try_get("last_position")?,
            watched_at: str_to_datetime(&watched_at_str)
                .map_err(|e| sqlx::Error::Decode(e.into()))?,
            is_completed: int_to_bool(is_completed_int),
            title: row.try_get("title")?,
            thumbnail_url: row.try_get("thumbnail_url")?,
            duration: row.try_get("duration")?,
        })
    }
}

/// Playback state written for a (user, content) pair
#[derive(Debug, Clone)]
pub struct UpsertViewingHistory {
    pub user_id: i64,
    pub content_id: i64,
    pub last_position: i64,
    pub watch_duration: i64,
    pub is_completed: bool,
}

pub struct ViewingHistoryRepository {
    pool: SqlitePool,
}

impl ViewingHistoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open a viewing session and return the position to resume from.
    ///
    /// Creates the row at position 0, or refreshes `watched_at` and clears
    /// `is_completed` on an existing row while keeping its position.
    pub async fn start_session(&self, user_id: i64, content_id: i64) -> Result<i64> {
        let (last_position,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO viewing_histories
                (user_id, content_id, watch_duration, last_position, watched_at, is_completed)
            VALUES (?, ?, 0, 0, ?, 0)
            ON CONFLICT (user_id, content_id) DO UPDATE SET
                watched_at = excluded.watched_at,
                is_completed = 0
            RETURNING last_position
            "#,
        )
        .bind(user_id)
        .bind(content_id)
        .bind(now_iso8601())
        .fetch_one(&self.pool)
        .await?;

        Ok(last_position)
    }

    /// Insert or overwrite the row for the pair in one statement.
    pub async fn upsert(&self, input: UpsertViewingHistory) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO viewing_histories
                (user_id, content_id, watch_duration, last_position, watched_at, is_completed)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT (user_id, content_id) DO UPDATE SET
                watch_duration = excluded.watch_duration,
                last_position = excluded.last_position,
                watched_at = excluded.watched_at,
                is_completed = excluded.is_completed
            "#,
        )
        .bind(input.user_id)
        .bind(input.content_id)
        .bind(input.watch_duration)
        .bind(input.last_position)
        .bind(now_iso8601())
        .bind(bool_to_int(input.is_completed))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Overwrite the state of an existing row. Returns the number of rows
    /// touched, which is 0 when no session was ever started for the pair.
    pub async fn update_position(&self, input: UpsertViewingHistory) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE viewing_histories
            SET last_position = ?, watch_duration = ?, watched_at = ?, is_completed = ?
            WHERE user_id = ? AND content_id = ?
            "#,
        )
        .bind(input.last_position)
        .bind(input.watch_duration)
        .bind(now_iso8601())
        .bind(bool_to_int(input.is_completed))
        .bind(input.user_id)
        .bind(input.content_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn last_position(&self, user_id: i64, content_id: i64) -> Result<Option<i64>> {
        let row: Option<(i64,)> = sqlx::query_as(
            "SELECT last_position FROM viewing_histories WHERE user_id = ? AND content_id = ?",
        )
        .bind(user_id)
        .bind(content_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|(position,)| position))
    }

    /// The user's history with content metadata, most recently watched first.
    pub async fn list_for_user(&self, user_id: i64) -> Result<Vec<HistoryEntryRecord>> {
        let rows = sqlx::query_as::<_, HistoryEntryRecord>(
            r#"
            SELECT vh.id, vh.content_id, vh.watch_duration, vh.last_position,
                   vh.watched_at, vh.is_completed,
                   c.title, c.thumbnail_url, c.duration
            FROM viewing_histories vh
            JOIN contents c ON c.id = vh.content_id
            WHERE vh.user_id = ?
            ORDER BY vh.watched_at DESC, vh.id DESC
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

    fn state(user_id: i64, content_id: i64, position: i64) -> UpsertViewingHistory {
        UpsertViewingHistory {
            user_id,
            content_id,
            last_position: position,
            watch_duration: position,
            is_completed: false,
        }
    }

    #[tokio::test]
    async fn test_session_resumes_from_saved_position() {
        let db = seeded_db().await;
        let user_id = insert_user(&db, "ada@example.com").await;
        let history = db.viewing_history();

        assert_eq!(history.start_session(user_id, 1).await.unwrap(), 0);
        assert_eq!(history.update_position(state(user_id, 1, 42)).await.unwrap(), 1);
        assert_eq!(history.start_session(user_id, 1).await.unwrap(), 42);
        assert_eq!(history.last_position(user_id, 1).await.unwrap(), Some(42));
    }

    #[tokio::test]
    async fn test_restart_clears_completion() {
        let db = seeded_db().await;
        let user_id = insert_user(&db, "ada@example.com").await;
        let history = db.viewing_history();

        history
            .upsert(UpsertViewingHistory {
                is_completed: true,
                ..state(user_id, 1, 5400)
            })
            .await
            .unwrap();
        assert!(history.list_for_user(user_id).await.unwrap()[0].is_completed);

        history.start_session(user_id, 1).await.unwrap();
        let entries = history.list_for_user(user_id).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert!(!entries[0].is_completed);
        assert_eq!(entries[0].last_position, 5400);
    }

    #[tokio::test]
    async fn test_update_without_session_touches_nothing() {
        let db = seeded_db().await;
        let user_id = insert_user(&db, "ada@example.com").await;
        let history = db.viewing_history();

        assert_eq!(history.update_position(state(user_id, 1, 42)).await.unwrap(), 0);
        assert_eq!(history.last_position(user_id, 1).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_upsert_keeps_one_row_per_pair() {
        let db = seeded_db().await;
        let user_id = insert_user(&db, "ada@example.com").await;
        let history = db.viewing_history();

        history.upsert(state(user_id, 2, 10)).await.unwrap();
        history.upsert(state(user_id, 2, 20)).await.unwrap();
        history.upsert(state(user_id, 3, 30)).await.unwrap();

        let entries = history.list_for_user(user_id).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].content_id, 3);
        assert_eq!(entries[0].title, "Laugh Track");
        assert_eq!(entries[1].last_position, 20);
    }
}
