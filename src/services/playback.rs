//! Playback tracking: stream sessions, position saves and viewing history

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;
use utoipa::ToSchema;

use crate::db::{Database, HistoryEntryRecord, UpsertViewingHistory};

/// What a player needs to start or resume a stream
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StreamInfo {
    pub content_id: i64,
    pub streaming_url: String,
    pub duration: i64,
    pub last_position: i64,
}

/// Playback state reported by a client
#[derive(Debug, Clone, Copy)]
pub struct PlaybackState {
    pub position: i64,
    pub watch_duration: i64,
    pub is_completed: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HistoryEntry {
    pub id: i64,
    pub content_id: i64,
    pub watch_duration: i64,
    pub last_position: i64,
    pub watched_at: DateTime<Utc>,
    pub is_completed: bool,
    pub title: String,
    pub thumbnail_url: String,
    pub duration: i64,
    pub progress_percent: i64,
}

impl From<HistoryEntryRecord> for HistoryEntry {
    fn from(r: HistoryEntryRecord) -> Self {
        Self {
            progress_percent: progress_percent(r.watch_duration, r.duration),
            id: r.id,
            content_id: r.content_id,
            watch_duration: r.watch_duration,
            last_position: r.last_position,
            watched_at: r.watched_at,
            is_completed: r.is_completed,
            title: r.title,
            thumbnail_url: r.thumbnail_url,
            duration: r.duration,
        }
    }
}

/// Share of the content watched, floored and capped at 100. Zero-length content reports 0.
pub fn progress_percent(watch_duration: i64, duration: i64) -> i64 {
    if duration <= 0 {
        return 0;
    }
    (watch_duration.max(0).saturating_mul(100) / duration).min(100)
}

#[derive(Clone)]
pub struct PlaybackService {
    db: Database,
}

impl PlaybackService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Open or resume a viewing session. `None` if the content does not exist.
    pub async fn start_stream(&self, user_id: i64, content_id: i64) -> Result<Option<StreamInfo>> {
        let Some(content) = self.db.contents().get_by_id(content_id).await? else {
            return Ok(None);
        };

        let last_position = self
            .db
            .viewing_history()
            .start_session(user_id, content_id)
            .await?;
        debug!(user_id, content_id, last_position, "Stream session started");

        Ok(Some(StreamInfo {
            content_id: content.id,
            streaming_url: content.video_url,
            duration: content.duration,
            last_position,
        }))
    }

    /// Overwrite the saved state of an existing session.
    ///
    /// Without a prior `start_stream` there is no row to update; the call still
    /// succeeds and nothing is stored.
    pub async fn save_position(&self, user_id: i64, content_id: i64, state: PlaybackState) -> Result<()> {
        let updated = self
            .db
            .viewing_history()
            .update_position(UpsertViewingHistory {
                user_id,
                content_id,
                last_position: state.position,
                watch_duration: state.watch_duration,
                is_completed: state.is_completed,
            })
            .await?;

        if updated == 0 {
            debug!(user_id, content_id, "Position save matched no viewing session");
        }
        Ok(())
    }

    /// Record state whether or not a session exists. `false` if the content does not exist.
    pub async fn record_history(&self, user_id: i64, content_id: i64, state: PlaybackState) -> Result<bool> {
        if !self.db.contents().exists(content_id).await? {
            return Ok(false);
        }

        self.db
            .viewing_history()
            .upsert(UpsertViewingHistory {
                user_id,
                content_id,
                last_position: state.position,
                watch_duration: state.watch_duration,
                is_completed: state.is_completed,
            })
            .await?;
        Ok(true)
    }

    /// The user's history, most recently watched first
    pub async fn history(&self, user_id: i64) -> Result<Vec<HistoryEntry>> {
        let rows = self.db.viewing_history().list_for_user(user_id).await?;
        Ok(rows.into_iter().map(HistoryEntry::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{insert_user, seeded_db};

    fn at(position: i64) -> PlaybackState {
        PlaybackState {
            position,
            watch_duration: position,
            is_completed: false,
        }
    }

    #[test]
    fn test_progress_percent() {
        assert_eq!(progress_percent(0, 100), 0);
        assert_eq!(progress_percent(50, 100), 50);
        assert_eq!(progress_percent(2699, 5400), 49);
        assert_eq!(progress_percent(500, 100), 100);
        assert_eq!(progress_percent(10, 0), 0);
        assert_eq!(progress_percent(-5, 100), 0);
    }

    #[tokio::test]
    async fn test_stream_then_save_then_resume() {
        let db = seeded_db().await;
        let user_id = insert_user(&db, "ada@example.com").await;
        let playback = PlaybackService::new(db);

        let first = playback.start_stream(user_id, 1).await.unwrap().unwrap();
        assert_eq!(first.last_position, 0);
        assert_eq!(first.duration, 5400);
        assert_eq!(first.streaming_url, "/assets/videos/the-last-orbit.mp4");

        playback.save_position(user_id, 1, at(42)).await.unwrap();
        let second = playback.start_stream(user_id, 1).await.unwrap().unwrap();
        assert_eq!(second.last_position, 42);

        assert!(playback.start_stream(user_id, 999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_before_stream_stores_nothing() {
        let db = seeded_db().await;
        let user_id = insert_user(&db, "ada@example.com").await;
        let playback = PlaybackService::new(db);

        playback.save_position(user_id, 1, at(300)).await.unwrap();
        assert!(playback.history(user_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_record_history_and_listing() {
        let db = seeded_db().await;
        let user_id = insert_user(&db, "ada@example.com").await;
        let playback = PlaybackService::new(db);

        assert!(playback.record_history(user_id, 7, at(3450)).await.unwrap());
        assert!(!playback.record_history(user_id, 999, at(10)).await.unwrap());

        let history = playback.history(user_id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].title, "Quiet Harbor");
        assert_eq!(history[0].progress_percent, 50);
    }
}
