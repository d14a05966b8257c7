/// Startup sequence
///
/// Runs the steps that must finish before the listener is bound:
///
/// 1. resolve database credentials (environment or Secrets Manager)
/// 2. build the connection pool under the configured [`ConnectPolicy`]
/// 3. synchronize the schema
///
/// Credential errors are always fatal. Connectivity and schema errors are
/// fatal under `fail-fast` and logged under `lazy`, in which case the server
/// still starts and requests fail with 500 until the database is reachable.
///
/// Under `lazy` the connectivity check waits at most
/// `startup_check_timeout_seconds` (5 s by default). If it fails, schema sync
/// is skipped rather than left to wait out the pool's acquire timeout, so the
/// listener comes up after one bounded wait.

use crate::config::Config;
use anyhow::Context;
use sqlx::PgPool;
use std::time::Duration;
use tracing::{error, info, warn};
use userhub_shared::credentials;
use userhub_shared::db::pool::{self, verify_connectivity, ConnectPolicy, DatabaseConfig};
use userhub_shared::db::schema::{schema_status, sync_schema};

/// Resolves credentials, connects and synchronizes the schema
pub async fn bootstrap(config: &Config) -> anyhow::Result<PgPool> {
    let credentials = credentials::resolve(&config.database.credentials)
        .await
        .context("Error setting up database connection")?;

    let pool = pool::connect(&credentials, &config.database.pool)
        .await
        .context("Unable to connect to the database")?;

    prepare_schema(&pool, &config.database.pool).await?;

    Ok(pool)
}

/// Synchronizes the schema on a freshly built pool
///
/// Under `lazy`, an unreachable database skips the sync and any sync error is
/// logged; under `fail-fast` a sync error is returned.
pub async fn prepare_schema(pool: &PgPool, config: &DatabaseConfig) -> anyhow::Result<()> {
    if config.policy == ConnectPolicy::Lazy {
        let within = Duration::from_secs(config.startup_check_timeout_seconds);
        if !verify_connectivity(pool, within).await {
            warn!("Database unreachable; skipping schema sync");
            return Ok(());
        }
    }

    match sync_schema(pool).await {
        Ok(()) => {
            if let Ok(status) = schema_status(pool).await {
                info!(
                    applied_migrations = status.applied_migrations,
                    latest_version = ?status.latest_version,
                    "Database synced"
                );
            }
        }
        Err(err) if config.policy == ConnectPolicy::Lazy => {
            error!(error = %err, "Error syncing database; continuing startup");
        }
        Err(err) => return Err(err).context("Error syncing database"),
    }

    Ok(())
}
