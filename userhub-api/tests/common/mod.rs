/// Common test utilities for router tests
///
/// - `offline_app`: router over a pool that points at a closed port, for
///   behaviour that must not depend on the database
/// - `TestContext`: router over a private schema in a real database
///   (`DB_*` variables, defaults to a local `userhub_test` database)
/// - request/response helpers

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Executor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tower::ServiceExt;
use userhub_api::app::{build_router, AppState};
use userhub_api::config::Config;
use userhub_shared::credentials::{env, DbCredentials};
use userhub_shared::db::pool::connect_options;
use userhub_shared::db::schema::sync_schema;

static SCHEMA_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn default_config() -> Config {
    Config::from_lookup(|_| None).expect("default config is valid")
}

/// Router whose database is unreachable
pub fn offline_app() -> Router {
    let credentials = DbCredentials {
        database: "userhub".to_string(),
        user: "userhub".to_string(),
        password: "userhub".to_string(),
        host: "127.0.0.1".to_string(),
        port: 1,
    };

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(Duration::from_secs(1))
        .connect_lazy_with(connect_options(&credentials));

    build_router(AppState::new(pool, default_config()))
}

/// Router over a freshly synchronized private schema
pub struct TestContext {
    pub app: Router,
    pub db: PgPool,
    admin: PgPool,
    schema: String,
}

impl TestContext {
    pub async fn new() -> anyhow::Result<Self> {
        let credentials = env::from_env().unwrap_or_else(|_| DbCredentials {
            database: "userhub_test".to_string(),
            user: "userhub".to_string(),
            password: "userhub".to_string(),
            host: "localhost".to_string(),
            port: 5432,
        });
        let options = connect_options(&credentials);

        let admin = PgPoolOptions::new()
            .max_connections(1)
            .connect_with(options.clone())
            .await?;

        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.subsec_nanos())
            .unwrap_or_default();
        let schema = format!(
            "api_test_{}_{}_{}",
            std::process::id(),
            nanos,
            SCHEMA_COUNTER.fetch_add(1, Ordering::SeqCst)
        );
        admin.execute(format!("CREATE SCHEMA {}", schema).as_str()).await?;

        let search_path = format!("SET search_path TO {}", schema);
        let db = PgPoolOptions::new()
            .max_connections(5)
            .after_connect(move |conn, _meta| {
                let sql = search_path.clone();
                Box::pin(async move {
                    conn.execute(sql.as_str()).await?;
                    Ok(())
                })
            })
            .connect_with(options)
            .await?;

        sync_schema(&db).await?;

        let app = build_router(AppState::new(db.clone(), default_config()));

        Ok(Self {
            app,
            db,
            admin,
            schema,
        })
    }

    /// Sends a request and returns status plus parsed JSON body (Null if empty)
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        send(&self.app, request).await
    }

    /// Drops the private schema
    pub async fn cleanup(self) -> anyhow::Result<()> {
        self.db.close().await;
        self.admin
            .execute(format!("DROP SCHEMA {} CASCADE", self.schema).as_str())
            .await?;
        self.admin.close().await;
        Ok(())
    }
}

/// Builds a request with an optional JSON body
pub fn json_request(method: &str, uri: &str, body: Option<serde_json::Value>) -> Request<Body> {
    let builder = Request::builder().method(method).uri(uri);
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Sends a request through a router
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or_else(|_| {
            panic!("expected JSON body, got {:?}", String::from_utf8_lossy(&body))
        })
    };

    (status, json)
}
