//! Authentication service for accounts and JWT handling
//!
//! Provides:
//! - User registration and login
//! - Password hashing with bcrypt
//! - Bearer token issue and validation
//! - Profile reads and updates

use anyhow::anyhow;
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Config;
use crate::db::{CreateUser, Database, UpdateUser, UserRecord};

/// Token issuer, checked on every verification
pub const TOKEN_ISSUER: &str = "miniflix";

pub const MIN_PASSWORD_LEN: usize = 6;

// ============================================================================
// JWT Claims
// ============================================================================

/// Claims carried by a bearer token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    pub name: String,
    pub email: String,
    /// Subject (the account email)
    pub sub: String,
    pub iss: String,
    /// Expiration timestamp
    pub exp: i64,
    /// Issued at timestamp
    pub iat: i64,
    /// Not valid before
    pub nbf: i64,
}

// ============================================================================
// Auth Types
// ============================================================================

/// Caller identity recovered from a valid token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub id: i64,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct LoginResult {
    pub token: String,
    pub user: UserRecord,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateProfileInput {
    pub name: Option<String>,
    pub current_password: String,
    pub new_password: Option<String>,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),

    #[error("Email already registered")]
    EmailTaken,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Account is disabled")]
    AccountDisabled,

    #[error("Current password is incorrect")]
    IncorrectPassword,

    #[error("User not found")]
    UserNotFound,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type AuthResult<T> = std::result::Result<T, AuthError>;

// ============================================================================
// Configuration
// ============================================================================

#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// JWT signing secret
    pub jwt_secret: String,
    /// Token lifetime in hours (default: 24)
    pub token_lifetime_hours: i64,
    /// Bcrypt cost factor
    pub bcrypt_cost: u32,
}

impl AuthConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            jwt_secret: config.jwt_secret.clone(),
            token_lifetime_hours: config.jwt_expire_hours,
            bcrypt_cost: config.bcrypt_cost,
        }
    }
}

// ============================================================================
// Auth Service
// ============================================================================

#[derive(Clone)]
pub struct AuthService {
    db: Database,
    config: AuthConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl AuthService {
    pub fn new(db: Database, config: AuthConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());
        Self {
            db,
            config,
            encoding_key,
            decoding_key,
        }
    }

    // ========================================================================
    // Registration and Login
    // ========================================================================

    /// Create an account. The email must not already be registered.
    pub async fn register(&self, input: RegisterInput) -> AuthResult<UserRecord> {
        let email = input.email.trim().to_string();
        let name = input.name.trim().to_string();

        if !is_valid_email(&email) {
            return Err(AuthError::Validation("Invalid email address".to_string()));
        }
        validate_password(&input.password)?;
        if name.is_empty() {
            return Err(AuthError::Validation("Name is required".to_string()));
        }

        let users = self.db.users();
        if users.email_exists(&email).await? {
            return Err(AuthError::EmailTaken);
        }

        let password_hash = self.hash_password(input.password).await?;

        // A concurrent registration can pass the check above; the unique index decides.
        let user = users
            .create(CreateUser {
                email,
                password_hash,
                name,
            })
            .await
            .map_err(|e| if is_unique_violation(&e) { AuthError::EmailTaken } else { e.into() })?;

        tracing::info!(user_id = user.id, "Registered user");
        Ok(user)
    }

    /// Check credentials and issue a bearer token
    pub async fn login(&self, email: &str, password: &str) -> AuthResult<LoginResult> {
        let user = self
            .db
            .users()
            .get_by_email(email.trim())
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !user.is_active {
            return Err(AuthError::AccountDisabled);
        }
        if !self.verify_password(password.to_string(), user.password_hash.clone()).await? {
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.issue_token(&user)?;
        tracing::debug!(user_id = user.id, "User logged in");
        Ok(LoginResult { token, user })
    }

    // ========================================================================
    // Profile
    // ========================================================================

    pub async fn profile(&self, user_id: i64) -> AuthResult<UserRecord> {
        self.db
            .users()
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Update name and/or password after re-checking the current password.
    ///
    /// A blank name keeps the existing one.
    pub async fn update_profile(
        &self,
        user_id: i64,
        input: UpdateProfileInput,
    ) -> AuthResult<UserRecord> {
        if input.current_password.is_empty() {
            return Err(AuthError::Validation("Current password is required".to_string()));
        }

        let user = self.profile(user_id).await?;
        if !self
            .verify_password(input.current_password, user.password_hash.clone())
            .await?
        {
            return Err(AuthError::IncorrectPassword);
        }

        let name = input
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        let password_hash = match input.new_password.filter(|p| !p.is_empty()) {
            Some(new_password) => {
                validate_password(&new_password)?;
                Some(self.hash_password(new_password).await?)
            }
            None => None,
        };

        self.db
            .users()
            .update(
                user_id,
                UpdateUser {
                    name,
                    password_hash,
                    ..Default::default()
                },
            )
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    // ========================================================================
    // Tokens
    // ========================================================================

    /// Sign a token for `user` valid for the configured lifetime
    pub fn issue_token(&self, user: &UserRecord) -> AuthResult<String> {
        let now = Utc::now();
        let exp = Duration::try_hours(self.config.token_lifetime_hours)
            .filter(|lifetime| *lifetime > Duration::zero())
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or_else(|| {
                anyhow!(
                    "Token lifetime of {} hours is out of range",
                    self.config.token_lifetime_hours
                )
            })?;

        let claims = Claims {
            user_id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            sub: user.email.clone(),
            iss: TOKEN_ISSUER.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| anyhow!("Failed to create token: {}", e).into())
    }

    /// Validate signature, algorithm, issuer, `exp` and `nbf`.
    pub fn verify_token(&self, token: &str) -> AuthResult<AuthenticatedUser> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.set_issuer(&[TOKEN_ISSUER]);

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        Ok(AuthenticatedUser {
            id: token_data.claims.user_id,
            name: token_data.claims.name,
            email: token_data.claims.email,
        })
    }

    // ========================================================================
    // Helper Methods
    // ========================================================================

    async fn hash_password(&self, password: String) -> AuthResult<String> {
        let cost = self.config.bcrypt_cost;
        let hashed = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| anyhow!("Password hashing task failed: {}", e))?
            .map_err(|e| anyhow!("Failed to hash password: {}", e))?;
        Ok(hashed)
    }

    async fn verify_password(&self, password: String, hash: String) -> AuthResult<bool> {
        let matches = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|e| anyhow!("Password verification task failed: {}", e))?
            .map_err(|e| anyhow!("Failed to verify password: {}", e))?;
        Ok(matches)
    }
}

fn validate_password(password: &str) -> AuthResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

/// Minimal shape check: one `@`, non-empty local part, dotted domain, no whitespace.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.downcast_ref::<sqlx::Error>()
        .and_then(|e| e.as_database_error())
        .is_some_and(|e| e.is_unique_violation())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    async fn service() -> AuthService {
        let db = Database::connect_in_memory().await.unwrap();
        db.migrate().await.unwrap();
        AuthService::new(
            db,
            AuthConfig {
                jwt_secret: "unit-test-secret".to_string(),
                token_lifetime_hours: 1,
                bcrypt_cost: 4,
            },
        )
    }

    fn register_input(email: &str) -> RegisterInput {
        RegisterInput {
            email: email.to_string(),
            password: "hunter22".to_string(),
            name: "Ada".to_string(),
        }
    }

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("ada@example.com"));
        assert!(is_valid_email("a.b+tag@mail.example.org"));
        assert!(!is_valid_email("ada"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("ada@example"));
        assert!(!is_valid_email("ada@.com"));
        assert!(!is_valid_email("ada@@example.com"));
        assert!(!is_valid_email("ada @example.com"));
    }

    #[tokio::test]
    async fn test_register_then_login_round_trip() {
        let auth = service().await;
        let user = auth.register(register_input("ada@example.com")).await.unwrap();
        assert_ne!(user.password_hash, "hunter22");

        let login = auth.login("ada@example.com", "hunter22").await.unwrap();
        let caller = auth.verify_token(&login.token).unwrap();
        assert_eq!(caller.id, user.id);
        assert_eq!(caller.email, "ada@example.com");
        assert_eq!(caller.name, "Ada");
    }

    #[tokio::test]
    async fn test_register_rejects_bad_input() {
        let auth = service().await;

        let short = RegisterInput {
            password: "12345".to_string(),
            ..register_input("ada@example.com")
        };
        assert_matches!(auth.register(short).await, Err(AuthError::Validation(_)));

        let no_name = RegisterInput {
            name: "   ".to_string(),
            ..register_input("ada@example.com")
        };
        assert_matches!(auth.register(no_name).await, Err(AuthError::Validation(_)));

        assert_matches!(
            auth.register(register_input("not-an-email")).await,
            Err(AuthError::Validation(_))
        );
    }

    #[tokio::test]
    async fn test_duplicate_email() {
        let auth = service().await;
        auth.register(register_input("ada@example.com")).await.unwrap();
        assert_matches!(
            auth.register(register_input("ADA@example.com")).await,
            Err(AuthError::EmailTaken)
        );
    }

    #[tokio::test]
    async fn test_login_failures() {
        let auth = service().await;
        let user = auth.register(register_input("ada@example.com")).await.unwrap();

        assert_matches!(
            auth.login("ada@example.com", "wrong-password").await,
            Err(AuthError::InvalidCredentials)
        );
        assert_matches!(
            auth.login("nobody@example.com", "hunter22").await,
            Err(AuthError::InvalidCredentials)
        );

        auth.db
            .users()
            .update(
                user.id,
                UpdateUser {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_matches!(
            auth.login("ada@example.com", "hunter22").await,
            Err(AuthError::AccountDisabled)
        );
        // Disabled wins over a bad password
        assert_matches!(
            auth.login("ada@example.com", "wrong-password").await,
            Err(AuthError::AccountDisabled)
        );
    }

    #[tokio::test]
    async fn test_token_lifetime_out_of_range() {
        for hours in [0, -1, i64::MAX] {
            let mut auth = service().await;
            auth.config.token_lifetime_hours = hours;
            auth.register(register_input("ada@example.com")).await.unwrap();

            assert_matches!(
                auth.login("ada@example.com", "hunter22").await,
                Err(AuthError::Internal(_)),
                "lifetime {hours}"
            );
        }
    }

    #[tokio::test]
    async fn test_token_rejections() {
        let auth = service().await;
        let user = auth.register(register_input("ada@example.com")).await.unwrap();

        assert_matches!(auth.verify_token("garbage"), Err(AuthError::InvalidToken(_)));

        let now = Utc::now().timestamp();
        let expired = Claims {
            user_id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            sub: user.email.clone(),
            iss: TOKEN_ISSUER.to_string(),
            exp: now - 3600,
            iat: now - 7200,
            nbf: now - 7200,
        };
        let token = encode(&Header::default(), &expired, &auth.encoding_key).unwrap();
        assert_matches!(auth.verify_token(&token), Err(AuthError::InvalidToken(_)));

        let foreign = Claims {
            exp: now + 3600,
            ..expired
        };
        let token = encode(
            &Header::default(),
            &foreign,
            &EncodingKey::from_secret(b"some-other-secret"),
        )
        .unwrap();
        assert_matches!(auth.verify_token(&token), Err(AuthError::InvalidToken(_)));
    }

    #[tokio::test]
    async fn test_update_profile() {
        let auth = service().await;
        let user = auth.register(register_input("ada@example.com")).await.unwrap();

        let wrong = UpdateProfileInput {
            name: Some("Countess".to_string()),
            current_password: "nope-nope".to_string(),
            new_password: None,
        };
        assert_matches!(
            auth.update_profile(user.id, wrong).await,
            Err(AuthError::IncorrectPassword)
        );

        let missing = UpdateProfileInput::default();
        assert_matches!(
            auth.update_profile(user.id, missing).await,
            Err(AuthError::Validation(_))
        );

        let updated = auth
            .update_profile(
                user.id,
                UpdateProfileInput {
                    name: Some("  ".to_string()),
                    current_password: "hunter22".to_string(),
                    new_password: Some("correct-horse".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Ada");

        assert_matches!(
            auth.login("ada@example.com", "hunter22").await,
            Err(AuthError::InvalidCredentials)
        );
        auth.login("ada@example.com", "correct-horse").await.unwrap();
    }
}
