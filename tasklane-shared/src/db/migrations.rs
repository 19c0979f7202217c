//! Database migration runner
//!
//! Migrations live in `migrations/` at the workspace root and are embedded
//! into the binary at compile time. Each version has an `.up.sql` and a
//! `.down.sql` file.

use sqlx::{
    migrate::{MigrateDatabase, Migrator},
    postgres::PgPool,
    Postgres,
};
use tracing::{debug, info, warn};

/// Embedded migration set
pub static MIGRATOR: Migrator = sqlx::migrate!("../migrations");

/// Runs all pending database migrations
///
/// Each migration runs in its own transaction; a failure rolls that
/// migration back and stops the run.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    info!(
        available = MIGRATOR.iter().filter(|m| m.migration_type.is_up_migration()).count(),
        "Starting database migrations"
    );

    match MIGRATOR.run(pool).await {
        Ok(()) => {
            info!("All database migrations completed successfully");
            Ok(())
        }
        Err(e) => {
            warn!("Migration failed: {}", e);
            Err(e)
        }
    }
}

/// Creates the database if it doesn't exist
///
/// Meant for development; production databases are provisioned up front.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), sqlx::Error> {
    if !Postgres::database_exists(database_url).await? {
        info!("Database does not exist, creating it");
        Postgres::create_database(database_url).await?;
    } else {
        debug!("Database already exists");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_migrations_are_reversible() {
        let ups: Vec<i64> = MIGRATOR
            .iter()
            .filter(|m| m.migration_type.is_up_migration())
            .map(|m| m.version)
            .collect();
        let downs: Vec<i64> = MIGRATOR
            .iter()
            .filter(|m| m.migration_type.is_down_migration())
            .map(|m| m.version)
            .collect();

        assert_eq!(ups.len(), 3);
        assert_eq!(ups, downs);
    }
}
