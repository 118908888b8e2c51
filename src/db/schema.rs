//! Schema bootstrap for the catalog database
//!
//! Every statement is `CREATE ... IF NOT EXISTS`, so running the sync against an
//! existing database only creates what is missing.

use sqlx::SqlitePool;
use tracing::{debug, info, warn};

/// Result of a schema sync operation
#[derive(Debug, Default)]
pub struct SchemaSyncResult {
    pub tables_created: Vec<String>,
    pub errors: Vec<String>,
}

const USERS_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        email TEXT NOT NULL UNIQUE COLLATE NOCASE,
        password_hash TEXT NOT NULL,
        name TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        is_active INTEGER NOT NULL DEFAULT 1
    )
"#;

const CONTENTS_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS contents (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        thumbnail_url TEXT NOT NULL DEFAULT '',
        video_url TEXT NOT NULL DEFAULT '',
        duration INTEGER NOT NULL DEFAULT 0,
        release_year INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
"#;

const GENRES_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS genres (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        description TEXT NOT NULL DEFAULT ''
    )
"#;

const CONTENT_GENRES_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS content_genres (
        content_id INTEGER NOT NULL REFERENCES contents(id) ON DELETE CASCADE,
        genre_id INTEGER NOT NULL REFERENCES genres(id) ON DELETE CASCADE,
        PRIMARY KEY (content_id, genre_id)
    )
"#;

const WISHLISTS_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS wishlists (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL REFERENCES users(id),
        content_id INTEGER NOT NULL REFERENCES contents(id) ON DELETE CASCADE,
        created_at TEXT NOT NULL,
        UNIQUE (user_id, content_id)
    )
"#;

const VIEWING_HISTORIES_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS viewing_histories (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL REFERENCES users(id),
        content_id INTEGER NOT NULL REFERENCES contents(id) ON DELETE CASCADE,
        watch_duration INTEGER NOT NULL DEFAULT 0,
        last_position INTEGER NOT NULL DEFAULT 0,
        watched_at TEXT NOT NULL,
        is_completed INTEGER NOT NULL DEFAULT 0,
        UNIQUE (user_id, content_id)
    )
"#;

const TABLES: &[(&str, &str)] = &[
    ("users", USERS_SQL),
    ("contents", CONTENTS_SQL),
    ("genres", GENRES_SQL),
    ("content_genres", CONTENT_GENRES_SQL),
    ("wishlists", WISHLISTS_SQL),
    ("viewing_histories", VIEWING_HISTORIES_SQL),
];

const INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_contents_listing ON contents (release_year DESC, title)",
    "CREATE INDEX IF NOT EXISTS idx_content_genres_genre ON content_genres (genre_id)",
    "CREATE INDEX IF NOT EXISTS idx_viewing_histories_user ON viewing_histories (user_id, watched_at)",
];

/// Check if a table exists in the database
async fn table_exists(pool: &SqlitePool, table_name: &str) -> Result<bool, sqlx::Error> {
    let result: Option<(String,)> =
        sqlx::query_as("SELECT name FROM sqlite_master WHERE type='table' AND name = ?")
            .bind(table_name)
            .fetch_optional(pool)
            .await?;

    Ok(result.is_some())
}

/// Create every missing table and index.
pub async fn sync_schema(pool: &SqlitePool) -> SchemaSyncResult {
    let mut result = SchemaSyncResult::default();

    for (table, sql) in TABLES {
        let existed = table_exists(pool, table).await.unwrap_or(false);
        match sqlx::query(sql.trim()).execute(pool).await {
            Ok(_) if !existed => {
                debug!(table = table, "Created table");
                result.tables_created.push(table.to_string());
            }
            Ok(_) => {}
            Err(e) => {
                let msg = format!("Failed to create table {}: {}", table, e);
                warn!("{}", msg);
                result.errors.push(msg);
            }
        }
    }

    for sql in INDEXES {
        if let Err(e) = sqlx::query(sql).execute(pool).await {
            let msg = format!("Failed to create index: {}", e);
            warn!("{}", msg);
            result.errors.push(msg);
        }
    }

    if !result.tables_created.is_empty() {
        info!(tables = ?result.tables_created, "Schema sync created tables");
    }

    result
}
