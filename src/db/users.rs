//! Users repository for authentication and profiles

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use super::sqlite_helpers::{bool_to_int, int_to_bool, now_iso8601, str_to_datetime};

// ============================================================================
// User Records
// ============================================================================

/// Stored account, including the password hash. Never serialized directly.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateUser {
    pub email: String,
    pub password_hash: String,
    pub name: String,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub password_hash: Option<String>,
    pub is_active: Option<bool>,
}

type UserRow = (i64, String, String, String, i32, String, String);

const SELECT_USER: &str =
    "SELECT id, email, password_hash, name, is_active, created_at, updated_at FROM users";

fn user_from_row(r: UserRow) -> Result<UserRecord> {
    Ok(UserRecord {
        id: r.0,
        email: r.1,
        password_hash: r.2,
        name: r.3,
        is_active: int_to_bool(r.4),
        created_at: str_to_datetime(&r.5)?,
        updated_at: str_to_datetime(&r.6)?,
    })
}

// ============================================================================
// Repository
// ============================================================================

pub struct UsersRepository {
    pool: SqlitePool,
}

impl UsersRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new active user
    pub async fn create(&self, user: CreateUser) -> Result<UserRecord> {
        let now = now_iso8601();

        let result = sqlx::query(
            r#"
            INSERT INTO users (email, password_hash, name, is_active, created_at, updated_at)
            VALUES (?, ?, ?, 1, ?, ?)
            "#,
        )
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.name)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to create user"))
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i64) -> Result<Option<UserRecord>> {
        let row = sqlx::query_as::<_, UserRow>(&format!("{} WHERE id = ?", SELECT_USER))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(user_from_row).transpose()
    }

    /// Get user by email (case-insensitive)
    pub async fn get_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "{} WHERE email = ? COLLATE NOCASE",
            SELECT_USER
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(user_from_row).transpose()
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT id FROM users WHERE email = ? COLLATE NOCASE")
                .bind(email)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.is_some())
    }

    /// Apply the set fields of `update`. Returns `None` if the user does not exist.
    pub async fn update(&self, id: i64, update: UpdateUser) -> Result<Option<UserRecord>> {
        sqlx::query(
            r#"
            UPDATE users SET
                name = COALESCE(?, name),
                password_hash = COALESCE(?, password_hash),
                is_active = COALESCE(?, is_active),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(update.name)
        .bind(update.password_hash)
        .bind(update.is_active.map(bool_to_int))
        .bind(now_iso8601())
        .bind(id)
        .execute(&self.pool)
        .await?;

        self.get_by_id(id).await
    }
}
