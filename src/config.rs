//! Configuration for the showroom backend server.
//!
//! All configuration is loaded from environment variables. The token signing
//! secret is required and validated at startup - there is no fallback value.
//! No secrets are logged or printed via `Debug`.

use std::path::PathBuf;

use thiserror::Error;

/// Session token lifetime in seconds (8 hours)
pub const TOKEN_TTL_SECS: i64 = 8 * 60 * 60;

/// Minimum accepted length for the token signing secret
pub const MIN_SECRET_LEN: usize = 32;

/// Configuration errors that abort startup
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("TOKEN_SECRET must be at least {MIN_SECRET_LEN} bytes")]
    WeakSecret,
}

/// Server configuration
#[derive(Clone)]
pub struct Config {
    /// Server bind address
    pub bind_addr: String,

    /// Server port
    pub port: u16,

    /// PostgreSQL connection string (contains credentials)
    pub database_url: String,

    /// Secret for signing session tokens (required, min 32 bytes)
    pub token_secret: String,

    /// Directory uploaded images are written to
    pub upload_dir: PathBuf,

    /// Directory the static frontend is served from
    pub public_dir: PathBuf,

    /// Deployment environment; anything other than "production" relaxes
    /// TLS requirements toward the database
    pub environment: String,

    /// Username for the seeded admin account
    pub admin_username: String,

    /// Password for the seeded admin account; only consulted when no admin
    /// row exists yet
    pub admin_password: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let token_secret =
            std::env::var("TOKEN_SECRET").map_err(|_| ConfigError::Missing("TOKEN_SECRET"))?;
        if token_secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::WeakSecret);
        }

        Ok(Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),

            database_url: std::env::var("DATABASE_URL")
                .map_err(|_| ConfigError::Missing("DATABASE_URL"))?,
            token_secret,

            upload_dir: std::env::var("UPLOAD_DIR")
                .unwrap_or_else(|_| "uploads".to_string())
                .into(),
            public_dir: std::env::var("PUBLIC_DIR")
                .unwrap_or_else(|_| "public".to_string())
                .into(),

            environment: std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),

            admin_username: std::env::var("ADMIN_USERNAME")
                .unwrap_or_else(|_| "admin".to_string()),
            admin_password: std::env::var("ADMIN_PASSWORD").ok(),
        })
    }

    /// Whether the server is running against a production database
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("bind_addr", &self.bind_addr)
            .field("port", &self.port)
            .field("database_url", &"[REDACTED]")
            .field("token_secret", &"[REDACTED]")
            .field("upload_dir", &self.upload_dir)
            .field("public_dir", &self.public_dir)
            .field("environment", &self.environment)
            .field("admin_username", &self.admin_username)
            .field("admin_password", &"[REDACTED]")
            .finish()
    }
}
