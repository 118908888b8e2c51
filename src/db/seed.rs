//! Demo catalog for development databases.
//!
//! Inserts a small set of genres and titles with fixed ids. Uses
//! INSERT OR IGNORE so re-runs are idempotent (existing rows are preserved).

use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use super::sqlite_helpers::now_iso8601;

/// Result of running seed operations.
#[derive(Debug, Default)]
pub struct SeedResult {
    pub tables_seeded: Vec<String>,
    pub errors: Vec<String>,
}

struct GenreRow {
    id: i64,
    name: &'static str,
    description: &'static str,
}

struct ContentRow {
    id: i64,
    title: &'static str,
    description: &'static str,
    slug: &'static str,
    duration: i64,
    release_year: i64,
    genre_ids: &'static [i64],
}

const GENRES: &[GenreRow] = &[
    GenreRow { id: 1, name: "Action", description: "Chases, fights and high stakes" },
    GenreRow { id: 2, name: "Comedy", description: "Made to make you laugh" },
    GenreRow { id: 3, name: "Documentary", description: "True stories from the real world" },
    GenreRow { id: 4, name: "Drama", description: "Character driven storytelling" },
    GenreRow { id: 5, name: "Sci-Fi", description: "Space, time and technology" },
];

const CONTENTS: &[ContentRow] = &[
    ContentRow {
        id: 1,
        title: "The Last Orbit",
        description: "A stranded crew has one orbit left to find a way home.",
        slug: "the-last-orbit",
        duration: 5400,
        release_year: 2023,
        genre_ids: &[5, 4],
    },
    ContentRow {
        id: 2,
        title: "Midnight Heist",
        description: "Four strangers, one vault and a city-wide blackout.",
        slug: "midnight-heist",
        duration: 6300,
        release_year: 2022,
        genre_ids: &[1],
    },
    ContentRow {
        id: 3,
        title: "Laugh Track",
        description: "A sitcom writer discovers the studio audience is real.",
        slug: "laugh-track",
        duration: 5100,
        release_year: 2021,
        genre_ids: &[2],
    },
    ContentRow {
        id: 4,
        title: "Ocean Deep",
        description: "A year with the creatures of the midnight zone.",
        slug: "ocean-deep",
        duration: 4800,
        release_year: 2023,
        genre_ids: &[3],
    },
    ContentRow {
        id: 5,
        title: "Signal Lost",
        description: "A radio operator hears a broadcast from next week.",
        slug: "signal-lost",
        duration: 6000,
        release_year: 2020,
        genre_ids: &[5, 1],
    },
    ContentRow {
        id: 6,
        title: "Kitchen Wars",
        description: "Behind the scenes of the world's most chaotic cooking contest.",
        slug: "kitchen-wars",
        duration: 3600,
        release_year: 2021,
        genre_ids: &[2, 3],
    },
    ContentRow {
        id: 7,
        title: "Quiet Harbor",
        description: "Two brothers return to the fishing town they left behind.",
        slug: "quiet-harbor",
        duration: 6900,
        release_year: 2019,
        genre_ids: &[4],
    },
    ContentRow {
        id: 8,
        title: "Zero Hour",
        description: "The countdown to first contact has already started.",
        slug: "zero-hour",
        duration: 7200,
        release_year: 2023,
        genre_ids: &[1, 5],
    },
];

async fn seed_genres(pool: &SqlitePool) -> Result<u64, sqlx::Error> {
    let mut inserted = 0;
    for genre in GENRES {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO genres (id, name, description) VALUES (?, ?, ?)",
        )
        .bind(genre.id)
        .bind(genre.name)
        .bind(genre.description)
        .execute(pool)
        .await?;
        inserted += result.rows_affected();
    }
    Ok(inserted)
}

async fn seed_contents(pool: &SqlitePool) -> Result<u64, sqlx::Error> {
    let now = now_iso8601();
    let mut inserted = 0;
    for content in CONTENTS {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO contents
                (id, title, description, thumbnail_url, video_url, duration, release_year, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(content.id)
        .bind(content.title)
        .bind(content.description)
        .bind(format!("/assets/thumbnails/{}.jpg", content.slug))
        .bind(format!("/assets/videos/{}.mp4", content.slug))
        .bind(content.duration)
        .bind(content.release_year)
        .bind(&now)
        .bind(&now)
        .execute(pool)
        .await?;
        inserted += result.rows_affected();
    }
    Ok(inserted)
}

async fn seed_content_genres(pool: &SqlitePool) -> Result<u64, sqlx::Error> {
    let mut inserted = 0;
    for content in CONTENTS {
        for genre_id in content.genre_ids {
            let result = sqlx::query(
                "INSERT OR IGNORE INTO content_genres (content_id, genre_id) VALUES (?, ?)",
            )
            .bind(content.id)
            .bind(*genre_id)
            .execute(pool)
            .await?;
            inserted += result.rows_affected();
        }
    }
    Ok(inserted)
}

/// Seed the demo genres and titles. Tables must already exist.
pub async fn seed_demo_catalog(pool: &SqlitePool) -> SeedResult {
    let mut result = SeedResult::default();

    // Order matters: content_genres references both other tables.
    for (table, count) in [
        ("genres", seed_genres(pool).await),
        ("contents", seed_contents(pool).await),
        ("content_genres", seed_content_genres(pool).await),
    ] {
        match count {
            Ok(n) => {
                if n > 0 {
                    debug!(table = table, count = n, "Seeded table");
                    result.tables_seeded.push(format!("{} ({} rows)", table, n));
                }
            }
            Err(e) => {
                let msg = format!("Seed {}: {}", table, e);
                warn!("{}", msg);
                result.errors.push(msg);
            }
        }
    }

    if !result.tables_seeded.is_empty() {
        info!(tables = ?result.tables_seeded, "Demo catalog applied");
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let db = Database::connect_in_memory().await.unwrap();
        db.migrate().await.unwrap();

        let first = seed_demo_catalog(db.pool()).await;
        assert!(first.errors.is_empty(), "{:?}", first.errors);
        assert_eq!(first.tables_seeded.len(), 3);

        let second = seed_demo_catalog(db.pool()).await;
        assert!(second.errors.is_empty());
        assert!(second.tables_seeded.is_empty());

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM contents")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count, CONTENTS.len() as i64);
    }
}
