/// Schema synchronization
///
/// Brings the database up to the schema the service expects by running the
/// SQL migrations embedded from `userhub-shared/migrations/` at compile time.
///
/// Synchronization is additive only:
/// - every migration uses `CREATE ... IF NOT EXISTS`, so an existing `users`
///   table is left as is, rows included
/// - applied migrations are recorded in `_sqlx_migrations` and never re-run
/// - nothing here drops or truncates a table
///
/// # Example
///
/// ```no_run
/// use userhub_shared::db::schema::{schema_status, sync_schema};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
/// sync_schema(&pool).await?;
///
/// let status = schema_status(&pool).await?;
/// println!("Applied {} migrations", status.applied_migrations);
/// # Ok(())
/// # }
/// ```

use sqlx::migrate::{MigrateError, Migrator};
use sqlx::postgres::PgPool;
use tracing::{debug, info, warn};

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Migration status information
#[derive(Debug, Clone)]
pub struct SchemaStatus {
    /// Number of migrations that have been applied
    pub applied_migrations: usize,

    /// Latest applied migration version (timestamp)
    pub latest_version: Option<i64>,

    /// Whether every embedded migration has been applied
    pub is_up_to_date: bool,
}

/// Number of migrations compiled into the binary
pub fn embedded_migrations() -> usize {
    MIGRATOR.iter().count()
}

/// Runs all pending migrations
///
/// Safe to call on every startup; already-applied migrations are skipped.
///
/// # Errors
///
/// Returns an error if the database is unreachable, a migration fails, or a
/// previously applied migration was modified.
pub async fn sync_schema(pool: &PgPool) -> Result<(), MigrateError> {
    info!(embedded = embedded_migrations(), "Synchronizing database schema");

    match MIGRATOR.run(pool).await {
        Ok(()) => {
            info!("Database schema synchronized");
            Ok(())
        }
        Err(e) => {
            warn!("Schema synchronization failed: {}", e);
            Err(e)
        }
    }
}

/// Gets the current migration status
pub async fn schema_status(pool: &PgPool) -> Result<SchemaStatus, sqlx::Error> {
    debug!("Checking schema status");

    let table_exists: bool = sqlx::query_scalar(
        "SELECT EXISTS (
            SELECT FROM information_schema.tables
            WHERE table_schema = current_schema()
            AND table_name = '_sqlx_migrations'
        )",
    )
    .fetch_one(pool)
    .await?;

    if !table_exists {
        debug!("Migrations table does not exist yet");
        return Ok(SchemaStatus {
            applied_migrations: 0,
            latest_version: None,
            is_up_to_date: embedded_migrations() == 0,
        });
    }

    let (count, latest_version): (i64, Option<i64>) = sqlx::query_as(
        "SELECT
            COUNT(*) as count,
            MAX(version) as latest_version
         FROM _sqlx_migrations
         WHERE success = true",
    )
    .fetch_one(pool)
    .await?;

    debug!(
        applied_migrations = count,
        latest_version = ?latest_version,
        "Schema status retrieved"
    );

    let applied_migrations = count as usize;
    Ok(SchemaStatus {
        applied_migrations,
        latest_version,
        is_up_to_date: applied_migrations >= embedded_migrations(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_users_migration_is_embedded() {
        assert!(embedded_migrations() >= 1);

        let first = MIGRATOR.iter().next().expect("at least one migration");
        assert!(first.sql.contains("CREATE TABLE IF NOT EXISTS users"));
    }

    #[test]
    fn test_migrations_are_non_destructive() {
        for migration in MIGRATOR.iter() {
            let sql = migration.sql.to_ascii_uppercase();
            assert!(!sql.contains("DROP "), "migration {} drops objects", migration.version);
            assert!(!sql.contains("TRUNCATE"), "migration {} truncates", migration.version);
        }
    }
}
