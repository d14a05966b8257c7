/// Database connection pool management
///
/// This module builds the single long-lived PostgreSQL pool the service shares
/// across requests. Connection options are assembled field by field from
/// [`DbCredentials`], so passwords never need URL escaping.
///
/// Whether an unreachable database at startup is fatal is decided by
/// [`ConnectPolicy`]:
///
/// - `Lazy`: the pool is created without connecting. The caller checks
///   connectivity once with [`verify_connectivity`], bounded by
///   `startup_check_timeout_seconds`, and failures are only logged. Queries
///   fail until the database is up.
/// - `FailFast`: the pool connects eagerly and the health check must pass.
///
/// # Example
///
/// ```no_run
/// use userhub_shared::credentials::{resolve, CredentialSource};
/// use userhub_shared::db::pool::{connect, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let credentials = resolve(&CredentialSource::Environment).await?;
/// let pool = connect(&credentials, &DatabaseConfig::default()).await?;
///
/// let row: (i64,) = sqlx::query_as("SELECT $1")
///     .bind(42i64)
///     .fetch_one(&pool)
///     .await?;
/// # Ok(())
/// # }
/// ```

use crate::credentials::DbCredentials;
use serde::Serialize;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// What to do when the database is unreachable at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectPolicy {
    /// Log the failure and keep going; the first query surfaces the error
    #[default]
    Lazy,

    /// Abort startup
    FailFast,
}

impl FromStr for ConnectPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lazy" => Ok(ConnectPolicy::Lazy),
            "fail-fast" | "fail_fast" | "failfast" => Ok(ConnectPolicy::FailFast),
            other => Err(format!(
                "unknown connect policy {:?} (expected \"lazy\" or \"fail-fast\")",
                other
            )),
        }
    }
}

impl fmt::Display for ConnectPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectPolicy::Lazy => f.write_str("lazy"),
            ConnectPolicy::FailFast => f.write_str("fail-fast"),
        }
    }
}

/// Configuration for the database connection pool
///
/// All timeouts are specified in seconds for ease of configuration from environment variables.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of idle connections to maintain
    pub min_connections: u32,

    /// Timeout for acquiring a connection from the pool (seconds)
    pub acquire_timeout_seconds: u64,

    /// How long a connection can remain idle before being closed (seconds)
    ///
    /// None = connections never closed due to idle time
    pub idle_timeout_seconds: Option<u64>,

    /// Maximum lifetime of a connection before forced recycling (seconds)
    pub max_lifetime_seconds: Option<u64>,

    /// Whether to test connections before returning them from the pool
    pub test_before_acquire: bool,

    /// Upper bound on the one-off connectivity check at startup (seconds)
    ///
    /// Kept well below `acquire_timeout_seconds` so an unreachable database
    /// does not hold back the listener.
    pub startup_check_timeout_seconds: u64,

    /// Startup connectivity policy
    pub policy: ConnectPolicy,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 0,
            acquire_timeout_seconds: 30,
            idle_timeout_seconds: Some(600),
            max_lifetime_seconds: Some(1800),
            test_before_acquire: true,
            startup_check_timeout_seconds: 5,
            policy: ConnectPolicy::Lazy,
        }
    }
}

impl DatabaseConfig {
    fn pool_options(&self) -> PgPoolOptions {
        let mut pool_options = PgPoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .acquire_timeout(Duration::from_secs(self.acquire_timeout_seconds))
            .test_before_acquire(self.test_before_acquire);

        if let Some(idle_timeout) = self.idle_timeout_seconds {
            pool_options = pool_options.idle_timeout(Duration::from_secs(idle_timeout));
            debug!(idle_timeout_seconds = idle_timeout, "Set idle timeout");
        }

        if let Some(max_lifetime) = self.max_lifetime_seconds {
            pool_options = pool_options.max_lifetime(Duration::from_secs(max_lifetime));
            debug!(max_lifetime_seconds = max_lifetime, "Set max lifetime");
        }

        pool_options
    }
}

/// Builds PostgreSQL connect options from resolved credentials
pub fn connect_options(credentials: &DbCredentials) -> PgConnectOptions {
    PgConnectOptions::new()
        .host(&credentials.host)
        .port(credentials.port)
        .username(&credentials.user)
        .password(&credentials.password)
        .database(&credentials.database)
}

/// Creates the connection pool according to the configured policy
///
/// Under [`ConnectPolicy::Lazy`] this never fails and never touches the
/// network; pair it with [`verify_connectivity`].
///
/// # Errors
///
/// Under [`ConnectPolicy::FailFast`], returns an error if the database cannot
/// be reached or the health check fails.
pub async fn connect(credentials: &DbCredentials, config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    info!(
        host = %credentials.host,
        port = credentials.port,
        database = %credentials.database,
        max_connections = config.max_connections,
        policy = %config.policy,
        "Creating database connection pool"
    );

    let options = connect_options(credentials);

    let pool = match config.policy {
        ConnectPolicy::FailFast => {
            let pool = config.pool_options().connect_with(options).await?;
            health_check(&pool).await?;
            info!("Database connected");
            pool
        }
        ConnectPolicy::Lazy => {
            config.pool_options().connect_lazy_with(options)
        }
    };

    Ok(pool)
}

/// Checks connectivity once, logging instead of failing
///
/// Gives up after `within` even if the pool's acquire timeout is longer.
/// Returns whether the database answered.
pub async fn verify_connectivity(pool: &PgPool, within: Duration) -> bool {
    match tokio::time::timeout(within, health_check(pool)).await {
        Ok(Ok(())) => {
            info!("Database connected");
            true
        }
        Ok(Err(err)) => {
            error!(error = %err, "Unable to connect to the database; continuing startup");
            false
        }
        Err(_) => {
            error!(
                timeout_ms = within.as_millis() as u64,
                "Database did not answer in time; continuing startup"
            );
            false
        }
    }
}

/// Performs a health check on the database connection
///
/// Executes a simple query to verify the database is reachable and responding.
pub async fn health_check(pool: &PgPool) -> Result<(), sqlx::Error> {
    debug!("Performing database health check");

    let result: (i32,) = sqlx::query_as("SELECT 1")
        .fetch_one(pool)
        .await?;

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

/// Current pool occupancy
#[derive(Debug, Clone, Serialize)]
pub struct PoolStats {
    /// Number of connections currently in use
    pub active_connections: usize,

    /// Number of idle connections available
    pub idle_connections: usize,

    /// Total connections in the pool
    pub total_connections: usize,
}

pub fn get_pool_stats(pool: &PgPool) -> PoolStats {
    let size = pool.size();
    let idle = pool.num_idle() as usize;

    PoolStats {
        active_connections: (size as usize).saturating_sub(idle),
        idle_connections: idle,
        total_connections: size as usize,
    }
}

/// Gracefully closes the connection pool
///
/// Call during shutdown so in-flight connections are returned and closed.
pub async fn close_pool(pool: PgPool) {
    info!("Closing database connection pool");
    pool.close().await;
    info!("Database connection pool closed");
}
