/// `GET /health`
///
/// Answers `200 OK` even while the database is down; the body tells the two
/// cases apart:
///
/// ```json
/// {
///   "status": "degraded",
///   "version": "0.1.0",
///   "database": "disconnected",
///   "connect_policy": "lazy",
///   "pool": { "active_connections": 0, "idle_connections": 0, "total_connections": 0 }
/// }
/// ```

use crate::app::AppState;
use axum::{extract::State, Json};
use serde::Serialize;
use userhub_shared::db::pool::{get_pool_stats, health_check, PoolStats};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `healthy` or `degraded`
    pub status: &'static str,

    pub version: &'static str,

    /// `connected` or `disconnected`
    pub database: &'static str,

    /// Startup connectivity policy the service runs under
    pub connect_policy: String,

    /// Pool occupancy at the time of the check
    pub pool: PoolStats,
}

pub async fn health_check_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let connected = health_check(&state.db).await.is_ok();

    Json(HealthResponse {
        status: if connected { "healthy" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        database: if connected { "connected" } else { "disconnected" },
        connect_policy: state.config.database.pool.policy.to_string(),
        pool: get_pool_stats(&state.db),
    })
}
