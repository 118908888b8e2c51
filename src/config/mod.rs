//! Application configuration management
//!
//! Settings come from `config/config.{APP_ENV}.json` (or `config/config.json`)
//! with environment variables taking precedence. Every field has a default, so
//! running without a file works.

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use tracing::{info, warn};

/// Upper bound for `jwt_expire_hours` (one year)
pub const MAX_JWT_EXPIRE_HOURS: i64 = 24 * 365;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Deployment environment, taken from APP_ENV
    #[serde(skip)]
    pub env: String,

    /// Bind address
    pub host: String,

    /// Server port
    pub port: u16,

    /// SQLite URL, e.g. `sqlite:./data/miniflix.db`
    pub database_url: String,

    pub database_max_connections: u32,

    /// HS256 signing secret for bearer tokens
    pub jwt_secret: String,

    /// Bearer token lifetime
    pub jwt_expire_hours: i64,

    /// Allowed CORS origins. Empty or `*` allows any origin.
    pub cors_allow_origins: Vec<String>,

    /// Directory served under /assets/videos
    pub media_path: String,

    /// Directory served under /assets/thumbnails
    pub thumbnail_path: String,

    pub bcrypt_cost: u32,

    /// Insert the demo genres and titles at startup
    pub seed_demo_catalog: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            env: "development".to_string(),
            host: "0.0.0.0".to_string(),
            port: 8080,
            database_url: "sqlite:./data/miniflix.db".to_string(),
            database_max_connections: 10,
            jwt_secret: String::new(),
            jwt_expire_hours: 24,
            cors_allow_origins: Vec::new(),
            media_path: "./assets/videos".to_string(),
            thumbnail_path: "./assets/thumbnails".to_string(),
            bcrypt_cost: bcrypt::DEFAULT_COST,
            seed_demo_catalog: false,
        }
    }
}

impl Config {
    /// Load configuration from the config directory and the process environment
    pub fn load() -> Result<Self> {
        let app_env = env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        let mut config = Self::from_dir(Path::new("config"), &app_env)?;
        config.apply_overrides(|key| env::var(key).ok())?;
        config.validate()?;
        config.ensure_jwt_secret()?;
        Ok(config)
    }

    /// Read the first existing config file for `app_env` under `dir`.
    pub fn from_dir(dir: &Path, app_env: &str) -> Result<Self> {
        let candidates: [PathBuf; 2] = [
            dir.join(format!("config.{}.json", app_env)),
            dir.join("config.json"),
        ];

        let mut config = match candidates.iter().find(|path| path.is_file()) {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                let config: Config = serde_json::from_str(&raw)
                    .with_context(|| format!("Invalid config file {}", path.display()))?;
                info!(path = %path.display(), "Loaded config file");
                config
            }
            None => Config::default(),
        };

        config.env = app_env.to_string();
        Ok(config)
    }

    /// Apply environment overrides, reading each variable through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("PORT") {
            self.port = port.parse().context("Invalid PORT")?;
        }
        if let Some(url) = lookup("DATABASE_URL") {
            self.database_url = url;
        }
        if let Some(max) = lookup("DATABASE_MAX_CONNECTIONS") {
            self.database_max_connections =
                max.parse().context("Invalid DATABASE_MAX_CONNECTIONS")?;
        }
        if let Some(secret) = lookup("JWT_SECRET") {
            self.jwt_secret = secret;
        }
        if let Some(hours) = lookup("JWT_EXPIRE_HOURS") {
            self.jwt_expire_hours = hours.parse().context("Invalid JWT_EXPIRE_HOURS")?;
        }
        if let Some(origins) = lookup("CORS_ALLOW_ORIGINS") {
            self.cors_allow_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(path) = lookup("MEDIA_PATH") {
            self.media_path = path;
        }
        if let Some(path) = lookup("THUMBNAIL_PATH") {
            self.thumbnail_path = path;
        }
        if let Some(cost) = lookup("BCRYPT_COST") {
            self.bcrypt_cost = cost.parse().context("Invalid BCRYPT_COST")?;
        }
        if let Some(seed) = lookup("SEED_DEMO_CATALOG") {
            self.seed_demo_catalog = seed == "true" || seed == "1";
        }
        Ok(())
    }

    /// Reject values that would break token issuing or the pool
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_JWT_EXPIRE_HOURS).contains(&self.jwt_expire_hours) {
            bail!(
                "jwt_expire_hours must be between 1 and {}, got {}",
                MAX_JWT_EXPIRE_HOURS,
                self.jwt_expire_hours
            );
        }
        if self.database_max_connections == 0 {
            bail!("database_max_connections must be at least 1");
        }
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.env == "production"
    }

    /// Production refuses to start without a secret; elsewhere one is generated.
    fn ensure_jwt_secret(&mut self) -> Result<()> {
        if !self.jwt_secret.is_empty() {
            return Ok(());
        }
        if self.is_production() {
            bail!("JWT_SECRET must be set in production");
        }

        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};
        let mut hasher = DefaultHasher::new();
        std::time::SystemTime::now().hash(&mut hasher);
        self.jwt_secret = format!("dev-secret-{}", hasher.finish());
        warn!("JWT_SECRET not set, using a generated development secret; tokens will not survive a restart");
        Ok(())
    }
}
