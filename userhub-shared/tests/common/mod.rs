/// Shared fixtures for database-backed tests
///
/// These tests require a running PostgreSQL database and are `#[ignore]`d by
/// default. Run with:
///
/// ```text
/// DB_HOST=localhost DB_USER=userhub DB_PASSWORD=userhub DB_NAME=userhub_test \
///     cargo test -p userhub-shared -- --ignored
/// ```
///
/// Each fixture works inside a fresh schema that is dropped on cleanup, so
/// tests can run in parallel and assert on table-wide state.

use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Executor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use userhub_shared::credentials::{env, DbCredentials};
use userhub_shared::db::pool::connect_options;

static SCHEMA_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Credentials from `DB_*` variables, falling back to a local test database
pub fn test_credentials() -> DbCredentials {
    env::from_env().unwrap_or_else(|_| DbCredentials {
        database: "userhub_test".to_string(),
        user: "userhub".to_string(),
        password: "userhub".to_string(),
        host: "localhost".to_string(),
        port: 5432,
    })
}

fn unique_schema_name() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or_default();
    format!(
        "test_{}_{}_{}",
        std::process::id(),
        nanos,
        SCHEMA_COUNTER.fetch_add(1, Ordering::SeqCst)
    )
}

/// A pool whose connections resolve unqualified names in a private schema
pub struct TestDatabase {
    pub pool: PgPool,
    admin: PgPool,
    schema: String,
}

impl TestDatabase {
    pub async fn new() -> Self {
        let options = connect_options(&test_credentials());

        let admin = PgPoolOptions::new()
            .max_connections(1)
            .connect_with(options.clone())
            .await
            .expect("Failed to connect to test database");

        let schema = unique_schema_name();
        admin
            .execute(format!("CREATE SCHEMA {}", schema).as_str())
            .await
            .expect("Failed to create test schema");

        let search_path = format!("SET search_path TO {}", schema);
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .after_connect(move |conn, _meta| {
                let sql = search_path.clone();
                Box::pin(async move {
                    conn.execute(sql.as_str()).await?;
                    Ok(())
                })
            })
            .connect_with(options)
            .await
            .expect("Failed to create test pool");

        Self { pool, admin, schema }
    }

    pub async fn cleanup(self) {
        self.pool.close().await;
        self.admin
            .execute(format!("DROP SCHEMA {} CASCADE", self.schema).as_str())
            .await
            .expect("Failed to drop test schema");
        self.admin.close().await;
    }
}
