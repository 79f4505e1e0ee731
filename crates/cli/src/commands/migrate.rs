//! Database migration commands.
//!
//! # Usage
//!
//! ```bash
//! # Apply pending migrations
//! homestead migrate run
//!
//! # List migrations and whether each has been applied
//! homestead migrate status
//! ```
//!
//! # Environment Variables
//!
//! - `HOMESTEAD_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! # Migration Files
//!
//! Migrations live in `crates/api/migrations/` and are embedded at compile time.

use std::collections::HashSet;

use sqlx::PgPool;
use sqlx::migrate::Migrator;
use thiserror::Error;

static MIGRATOR: Migrator = sqlx::migrate!("../api/migrations");

/// Errors from migration commands.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Apply all pending migrations.
///
/// # Errors
///
/// Returns `MigrationError` if the database URL is missing, the connection
/// fails, or a migration fails to apply.
pub async fn run() -> Result<(), MigrationError> {
    let pool = connect().await?;

    tracing::info!(available = MIGRATOR.iter().count(), "Running migrations...");
    MIGRATOR.run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}

/// Log each known migration and whether it has been applied.
///
/// # Errors
///
/// Returns `MigrationError` if the database URL is missing or the connection fails.
pub async fn status() -> Result<(), MigrationError> {
    let pool = connect().await?;

    let applied: HashSet<i64> = sqlx::query_scalar::<_, i64>(
        "SELECT version FROM _sqlx_migrations WHERE success",
    )
    .fetch_all(&pool)
    .await
    .unwrap_or_else(|e| {
        tracing::debug!(error = %e, "No migration history table yet");
        Vec::new()
    })
    .into_iter()
    .collect();

    for migration in MIGRATOR.iter() {
        tracing::info!(
            version = migration.version,
            description = %migration.description,
            applied = applied.contains(&migration.version),
            "Migration"
        );
    }

    let pending = MIGRATOR
        .iter()
        .filter(|m| !applied.contains(&m.version))
        .count();
    tracing::info!(pending, "Migration status");
    Ok(())
}

async fn connect() -> Result<PgPool, MigrationError> {
    dotenvy::dotenv().ok();

    let database_url = database_url(|key| std::env::var(key).ok())?;

    tracing::info!("Connecting to database...");
    Ok(PgPool::connect(&database_url).await?)
}

fn database_url(var: impl Fn(&str) -> Option<String>) -> Result<String, MigrationError> {
    var("HOMESTEAD_DATABASE_URL")
        .or_else(|| var("DATABASE_URL"))
        .filter(|url| !url.is_empty())
        .ok_or(MigrationError::MissingEnvVar("HOMESTEAD_DATABASE_URL"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn env<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| {
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| (*v).to_string())
        }
    }

    #[test]
    fn test_prefers_homestead_database_url() {
        let vars = [
            ("HOMESTEAD_DATABASE_URL", "postgres://a"),
            ("DATABASE_URL", "postgres://b"),
        ];
        assert_eq!(database_url(env(&vars)).unwrap(), "postgres://a");
    }

    #[test]
    fn test_falls_back_to_database_url() {
        let vars = [("DATABASE_URL", "postgres://b")];
        assert_eq!(database_url(env(&vars)).unwrap(), "postgres://b");
    }

    #[test]
    fn test_missing_database_url() {
        let err = database_url(env(&[])).unwrap_err();
        assert!(matches!(err, MigrationError::MissingEnvVar(_)));
    }

    #[test]
    fn test_migrations_are_embedded_in_order() {
        let versions: Vec<i64> = MIGRATOR.iter().map(|m| m.version).collect();
        assert_eq!(versions.len(), 3);
        assert!(versions.windows(2).all(|w| w[0] < w[1]));
    }
}
