//! PostgreSQL connection pool
//!
//! Builds a sqlx pool from [`DatabaseConfig`] and refuses to hand it out
//! until a health-check query succeeds.

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Configuration for the database connection pool
///
/// Timeouts are in seconds so they map directly onto environment variables.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of idle connections kept warm
    pub min_connections: u32,

    /// How long to wait for a free connection before failing
    pub connect_timeout_seconds: u64,

    /// Idle connections older than this are closed (None = never)
    pub idle_timeout_seconds: Option<u64>,

    /// Connections are recycled after this long (None = never)
    pub max_lifetime_seconds: Option<u64>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 10,
            min_connections: 2,
            connect_timeout_seconds: 30,
            idle_timeout_seconds: Some(600),
            max_lifetime_seconds: Some(1800),
        }
    }
}

/// Creates a PostgreSQL connection pool and verifies connectivity
///
/// # Errors
///
/// Returns an error if the URL is invalid, the server is unreachable, or the
/// health check fails.
pub async fn create_pool(config: DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        connect_timeout_seconds = config.connect_timeout_seconds,
        "Creating database connection pool"
    );

    let mut pool_options = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds));

    if let Some(idle_timeout) = config.idle_timeout_seconds {
        pool_options = pool_options.idle_timeout(Duration::from_secs(idle_timeout));
    }

    if let Some(max_lifetime) = config.max_lifetime_seconds {
        pool_options = pool_options.max_lifetime(Duration::from_secs(max_lifetime));
    }

    let pool = pool_options.connect(&config.url).await?;

    health_check(&pool).await?;

    info!("Database connection pool created successfully");
    Ok(pool)
}

/// Runs `SELECT 1` against the pool
pub async fn health_check(pool: &PgPool) -> Result<(), sqlx::Error> {
    let result: (i32,) = sqlx::query_as("SELECT 1").fetch_one(pool).await?;

    if result.0 == 1 {
        debug!("Database health check passed");
        Ok(())
    } else {
        warn!("Database health check returned unexpected value: {}", result.0);
        Err(sqlx::Error::Protocol(
            "Health check returned unexpected value".into(),
        ))
    }
}

/// Closes the pool, waiting for checked-out connections to return
pub async fn close_pool(pool: PgPool) {
    info!("Closing database connection pool");
    pool.close().await;
}
