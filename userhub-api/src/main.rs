//! # userhub API Server
//!
//! Serves `/users` CRUD endpoints backed by PostgreSQL.
//!
//! Startup order: load config → resolve credentials → connect → sync schema →
//! bind listener. The listener is only bound once the earlier steps return.
//!
//! ## Usage
//!
//! ```bash
//! DB_HOST=localhost DB_USER=userhub DB_PASSWORD=userhub DB_NAME=userhub \
//!     cargo run -p userhub-api
//!
//! # or with credentials from AWS Secrets Manager
//! DB_SECRET_NAME=prod/userhub-db AWS_REGION=eu-west-1 cargo run -p userhub-api
//! ```

use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use userhub_api::{
    app::{build_router, AppState},
    config::Config,
    startup,
};
use userhub_shared::db::pool::close_pool;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    tracing::info!(
        "userhub API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;
    let bind_address = config.bind_address();

    let pool = startup::bootstrap(&config).await?;

    let app = build_router(AppState::new(pool.clone(), config));

    let listener = TcpListener::bind(&bind_address).await?;
    tracing::info!("Server running on {}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    close_pool(pool).await;
    tracing::info!("Server shutdown complete");

    Ok(())
}

/// Installs the global subscriber
///
/// `RUST_LOG` controls filtering; `LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "userhub_api=debug,userhub_shared=debug,tower_http=debug".into());

    let json = std::env::var("LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
