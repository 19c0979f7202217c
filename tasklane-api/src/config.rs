//! Configuration management for the API server
//!
//! Configuration is read from environment variables once at startup. A
//! `.env` file in the working directory is honored for development.
//!
//! # Environment Variables
//!
//! - `API_HOST`: Host to bind to (default: 0.0.0.0)
//! - `API_PORT`: Port to bind to (default: 8080)
//! - `CORS_ORIGINS`: Comma-separated allowed origins, `*` for any (default: *)
//! - `STORAGE_BACKEND`: `postgres` or `memory` (default: postgres)
//! - `DATABASE_URL`: PostgreSQL connection string (required for postgres)
//! - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
//! - `DATABASE_MIN_CONNECTIONS`: Idle connections kept warm (default: 2)
//! - `DATABASE_CONNECT_TIMEOUT_SECONDS`: Wait for a free connection (default: 30)
//! - `DATABASE_IDLE_TIMEOUT_SECONDS`: Close idle connections after this, 0 = never (default: 600)
//! - `DATABASE_MAX_LIFETIME_SECONDS`: Recycle connections after this, 0 = never (default: 1800)
//! - `JWT_SECRET`: Secret key for token signing (required, at least 32 chars)
//! - `JWT_TTL_HOURS`: Access token lifetime, 1 to 8760 (default: 24)
//! - `PASSWORD_MEMORY_KIB`, `PASSWORD_ITERATIONS`, `PASSWORD_PARALLELISM`:
//!   Argon2id cost (defaults: 65536, 3, 4)
//! - `LOG_FORMAT`: `pretty` or `json` (default: pretty)
//! - `RUST_LOG`: Log filter (default: tasklane_api=debug,tower_http=debug)
//!
//! # Example
//!
//! ```no_run
//! use tasklane_api::config::Config;
//!
//! # fn example() -> anyhow::Result<()> {
//! let config = Config::from_env()?;
//! println!("Server will listen on {}", config.bind_address());
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::env;
use std::str::FromStr;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tasklane_shared::auth::password::PasswordParams;
use tasklane_shared::db::pool::DatabaseConfig;

/// Minimum accepted length of `JWT_SECRET`
pub const MIN_JWT_SECRET_LEN: usize = 32;

/// Longest accepted `JWT_TTL_HOURS` (one year)
pub const MAX_JWT_TTL_HOURS: i64 = 24 * 365;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Storage configuration
    pub storage: StorageConfig,

    /// JWT configuration
    pub jwt: JwtConfig,

    /// Argon2id cost for new password hashes
    pub password: PasswordParams,

    /// Log output format
    pub log_format: LogFormat,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Allowed CORS origins; `*` means any
    pub cors_origins: Vec<String>,
}

/// Which store backs the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            other => anyhow::bail!("Unknown STORAGE_BACKEND '{}' (expected postgres or memory)", other),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,

    /// PostgreSQL connection URL; `None` only with the memory backend
    pub database_url: Option<String>,

    /// Maximum number of connections in pool
    pub max_connections: u32,

    /// Minimum number of idle connections
    pub min_connections: u32,

    pub connect_timeout_seconds: u64,

    /// `None` keeps idle connections open
    pub idle_timeout_seconds: Option<u64>,

    /// `None` never recycles connections
    pub max_lifetime_seconds: Option<u64>,
}

/// JWT configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Secret key for JWT signing
    ///
    /// Must be kept secret and at least 32 bytes.
    /// Generate with: `openssl rand -hex 32`
    pub secret: String,

    /// Access token lifetime in hours
    pub ttl_hours: i64,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("ttl_hours", &self.ttl_hours)
            .finish()
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => anyhow::bail!("Unknown LOG_FORMAT '{}' (expected pretty or json)", other),
        }
    }
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required environment variables are missing
    /// - Environment variables have invalid values
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        Self::from_vars(env::vars().collect())
    }

    /// Builds configuration from an explicit variable map
    pub fn from_vars(vars: HashMap<String, String>) -> anyhow::Result<Self> {
        let var = |name: &str| vars.get(name).map(|v| v.trim()).filter(|v| !v.is_empty());

        fn parse_or<T>(value: Option<&str>, name: &str, default: T) -> anyhow::Result<T>
        where
            T: FromStr,
            T::Err: std::error::Error + Send + Sync + 'static,
        {
            match value {
                Some(raw) => raw
                    .parse::<T>()
                    .with_context(|| format!("{} has an invalid value '{}'", name, raw)),
                None => Ok(default),
            }
        }

        // Zero disables the limit
        fn optional_seconds(
            value: Option<&str>,
            name: &str,
            default: Option<u64>,
        ) -> anyhow::Result<Option<u64>> {
            match value {
                Some(raw) => Ok(Some(parse_or(Some(raw), name, 0u64)?).filter(|s| *s > 0)),
                None => Ok(default),
            }
        }

        let host = var("API_HOST").unwrap_or("0.0.0.0").to_string();
        let port = parse_or(var("API_PORT"), "API_PORT", 8080u16)?;
        let cors_origins = var("CORS_ORIGINS")
            .unwrap_or("*")
            .split(',')
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();

        let backend = match var("STORAGE_BACKEND") {
            Some(raw) => raw.parse::<StorageBackend>()?,
            None => StorageBackend::Postgres,
        };
        let database_url = var("DATABASE_URL").map(str::to_string);
        if backend == StorageBackend::Postgres && database_url.is_none() {
            anyhow::bail!("DATABASE_URL environment variable is required");
        }
        let pool_defaults = DatabaseConfig::default();
        let max_connections = parse_or(
            var("DATABASE_MAX_CONNECTIONS"),
            "DATABASE_MAX_CONNECTIONS",
            pool_defaults.max_connections,
        )?;
        let min_connections = parse_or(
            var("DATABASE_MIN_CONNECTIONS"),
            "DATABASE_MIN_CONNECTIONS",
            pool_defaults.min_connections,
        )?;
        if max_connections == 0 || min_connections > max_connections {
            anyhow::bail!(
                "DATABASE_MIN_CONNECTIONS ({}) must not exceed a non-zero DATABASE_MAX_CONNECTIONS ({})",
                min_connections,
                max_connections
            );
        }
        let connect_timeout_seconds = parse_or(
            var("DATABASE_CONNECT_TIMEOUT_SECONDS"),
            "DATABASE_CONNECT_TIMEOUT_SECONDS",
            pool_defaults.connect_timeout_seconds,
        )?;
        let idle_timeout_seconds = optional_seconds(
            var("DATABASE_IDLE_TIMEOUT_SECONDS"),
            "DATABASE_IDLE_TIMEOUT_SECONDS",
            pool_defaults.idle_timeout_seconds,
        )?;
        let max_lifetime_seconds = optional_seconds(
            var("DATABASE_MAX_LIFETIME_SECONDS"),
            "DATABASE_MAX_LIFETIME_SECONDS",
            pool_defaults.max_lifetime_seconds,
        )?;

        let secret = var("JWT_SECRET")
            .ok_or_else(|| anyhow::anyhow!("JWT_SECRET environment variable is required"))?
            .to_string();
        if secret.len() < MIN_JWT_SECRET_LEN {
            anyhow::bail!("JWT_SECRET must be at least {} characters long", MIN_JWT_SECRET_LEN);
        }
        let ttl_hours = parse_or(var("JWT_TTL_HOURS"), "JWT_TTL_HOURS", 24i64)?;
        if !(1..=MAX_JWT_TTL_HOURS).contains(&ttl_hours) {
            anyhow::bail!("JWT_TTL_HOURS must be between 1 and {}", MAX_JWT_TTL_HOURS);
        }

        let defaults = PasswordParams::default();
        let password = PasswordParams {
            memory_kib: parse_or(var("PASSWORD_MEMORY_KIB"), "PASSWORD_MEMORY_KIB", defaults.memory_kib)?,
            iterations: parse_or(var("PASSWORD_ITERATIONS"), "PASSWORD_ITERATIONS", defaults.iterations)?,
            parallelism: parse_or(var("PASSWORD_PARALLELISM"), "PASSWORD_PARALLELISM", defaults.parallelism)?,
        };

        let log_format = match var("LOG_FORMAT") {
            Some(raw) => raw.parse::<LogFormat>()?,
            None => LogFormat::Pretty,
        };

        Ok(Self {
            api: ApiConfig {
                host,
                port,
                cors_origins,
            },
            storage: StorageConfig {
                backend,
                database_url,
                max_connections,
                min_connections,
                connect_timeout_seconds,
                idle_timeout_seconds,
                max_lifetime_seconds,
            },
            jwt: JwtConfig { secret, ttl_hours },
            password,
            log_format,
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    /// Access token lifetime
    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.jwt.ttl_hours)
    }

    pub fn password_params(&self) -> PasswordParams {
        self.password
    }

    /// Pool settings for the postgres backend; `None` without a URL
    pub fn database_config(&self) -> Option<DatabaseConfig> {
        let url = self.storage.database_url.clone()?;
        Some(DatabaseConfig {
            url,
            max_connections: self.storage.max_connections,
            min_connections: self.storage.min_connections,
            connect_timeout_seconds: self.storage.connect_timeout_seconds,
            idle_timeout_seconds: self.storage.idle_timeout_seconds,
            max_lifetime_seconds: self.storage.max_lifetime_seconds,
        })
    }
}
