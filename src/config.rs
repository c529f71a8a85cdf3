//! Configuration module for environment variables and application settings
//!
//! Configuration is loaded once at startup and passed explicitly into the
//! server, the credential authority and the storage layer.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Result, anyhow};

/// Smallest accepted signing secret, in bytes.
const MIN_SECRET_LEN: usize = 16;

/// Longest accepted token lifetime: one year.
const MAX_TOKEN_TTL_MINUTES: i64 = 365 * 24 * 60;

#[derive(Debug, Clone)]
pub struct Config {
    /// Database configuration
    pub database: DatabaseConfig,

    /// Server configuration
    pub server: ServerConfig,

    /// Token signing and password policy
    pub auth: AuthConfig,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Postgres connection string, or `memory` for the in-process store
    pub url: String,
    pub max_connections: usize,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origins. Empty means any origin without credentials.
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub token_ttl: chrono::Duration,
    pub password_min_length: usize,
    pub password_max_length: usize,
    /// Whether the `access_token` cookie is marked `Secure`
    pub cookie_secure: bool,
}

// The secret must never end up in logs.
impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("jwt_issuer", &self.jwt_issuer)
            .field("token_ttl", &self.token_ttl)
            .field("password_min_length", &self.password_min_length)
            .field("password_max_length", &self.password_max_length)
            .field("cookie_secure", &self.cookie_secure)
            .finish()
    }
}

impl DatabaseConfig {
    /// True when the in-memory store was requested instead of Postgres.
    pub fn is_memory(&self) -> bool {
        self.url.eq_ignore_ascii_case("memory")
    }
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// A `.env` file in the working directory is honoured if present.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let jwt_secret = env::var("JWT_SECRET")
            .or_else(|_| env::var("SECRET_KEY"))
            .map_err(|_| anyhow!("JWT_SECRET environment variable is required"))?;
        if jwt_secret.len() < MIN_SECRET_LEN {
            return Err(anyhow!(
                "JWT_SECRET must be at least {} bytes long",
                MIN_SECRET_LEN
            ));
        }

        let token_ttl = parse_token_ttl(parse_var("ACCESS_TOKEN_EXPIRE_MINUTES", 24 * 60)?)?;

        let password_min_length = parse_var("PASSWORD_MIN_LENGTH", 8)?;
        let password_max_length = parse_var("PASSWORD_MAX_LENGTH", 128)?;
        if password_min_length == 0 || password_min_length > password_max_length {
            return Err(anyhow!(
                "PASSWORD_MIN_LENGTH must be between 1 and PASSWORD_MAX_LENGTH"
            ));
        }

        let port = match env::var("PORT") {
            Ok(port) => port
                .parse()
                .map_err(|_| anyhow!("PORT must be a valid port number"))?,
            Err(_) => parse_var("SERVER_PORT", 8000)?,
        };

        Ok(Self {
            database: DatabaseConfig {
                url: env::var("DATABASE_URL")
                    .map_err(|_| anyhow!("DATABASE_URL environment variable is required"))?,
                max_connections: parse_var("DATABASE_MAX_CONNECTIONS", 16)?,
                timeout: Duration::from_secs(parse_var("DATABASE_TIMEOUT_SECS", 30)?),
            },

            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port,
                cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                    .map(|origins| split_list(&origins))
                    .unwrap_or_default(),
            },

            auth: AuthConfig {
                jwt_secret,
                jwt_issuer: env::var("JWT_ISSUER").unwrap_or_else(|_| "todo-server".to_string()),
                token_ttl,
                password_min_length,
                password_max_length,
                cookie_secure: parse_var("COOKIE_SECURE", true)?,
            },
        })
    }

    /// In-memory configuration with a fixed secret, for tests and local demos.
    pub fn test_config() -> Self {
        Self {
            database: DatabaseConfig {
                url: "memory".to_string(),
                max_connections: 4,
                timeout: Duration::from_secs(5),
            },
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors_allowed_origins: Vec::new(),
            },
            auth: AuthConfig {
                jwt_secret: "test-secret-with-enough-entropy".to_string(),
                jwt_issuer: "todo-server".to_string(),
                token_ttl: chrono::Duration::hours(24),
                password_min_length: 8,
                password_max_length: 128,
                cookie_secure: false,
            },
        }
    }
}

/// Read an optional variable, falling back to `default` when unset.
/// A set but unparsable value is an error rather than silently ignored.
fn parse_var<T: FromStr>(name: &str, default: T) -> Result<T> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| anyhow!("{} has an invalid value: {:?}", name, raw)),
        Err(_) => Ok(default),
    }
}

fn parse_token_ttl(minutes: i64) -> Result<chrono::Duration> {
    if !(1..=MAX_TOKEN_TTL_MINUTES).contains(&minutes) {
        return Err(anyhow!(
            "ACCESS_TOKEN_EXPIRE_MINUTES must be between 1 and {}",
            MAX_TOKEN_TTL_MINUTES
        ));
    }
    Ok(chrono::Duration::minutes(minutes))
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
