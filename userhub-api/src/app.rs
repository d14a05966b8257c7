/// Shared state and the HTTP router
///
/// `main` builds the state once from the bootstrapped pool; router tests build
/// it over a pool of their own.
///
/// ```no_run
/// use userhub_api::{app::{build_router, AppState}, config::Config};
///
/// # async fn serve(pool: sqlx::PgPool) -> anyhow::Result<()> {
/// let router = build_router(AppState::new(pool, Config::from_env()?));
/// let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
/// axum::serve(listener, router).await?;
/// # Ok(())
/// # }
/// ```

use crate::config::Config;
use axum::{routing::get, Router};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

/// State handed to every handler
///
/// Cloning copies two handles; the pool's connections stay shared.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,

    /// Settings the process started with
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }
}

/// Wires the user and health routes
///
/// ```text
/// /
/// ├── GET    /health
/// ├── POST   /users
/// ├── GET    /users
/// ├── GET    /users/:id
/// ├── PUT    /users/:id
/// └── DELETE /users/:id
/// ```
///
/// Every request gets an INFO-level tracing span and a response event from
/// `tower_http::trace::TraceLayer`.
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let user_routes = Router::new()
        .route(
            "/users",
            get(routes::users::list_users).post(routes::users::create_user),
        )
        .route(
            "/users/:id",
            get(routes::users::get_user)
                .put(routes::users::update_user)
                .delete(routes::users::delete_user),
        );

    Router::new()
        .route("/health", get(routes::health::health_check_handler))
        .merge(user_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}
