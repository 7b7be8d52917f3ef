//! ERP API Server Binary
//!
//! # Usage
//!
//! ```bash
//! ERP_PORT=8080 ERP_DATABASE_URL=postgres://... ERP_JWT_SECRET=... cargo run --bin erp-api
//! ```
//!
//! # Environment Variables
//!
//! * `ERP_HOST` - Server host (default: 0.0.0.0)
//! * `ERP_PORT` - Server port (default: 8080)
//! * `ERP_JWT_SECRET` - HS256 signing secret (required in production)
//! * `ERP_DATABASE_URL` - PostgreSQL connection string
//! * `ERP_DATABASE_MAX_CONNECTIONS` - Pool size (default: 10)
//! * `ERP_LOG_LEVEL` - Filter directive; `RUST_LOG` takes precedence
//! * `ERP_LOG_JSON` - `true` for JSON log lines
//!
//! A `.env` file in the working directory is loaded first if present.

use anyhow::Context;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use infra_db::{create_pool, run_migrations, DatabaseConfig};
use interface_api::{config::ApiConfig, create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = ApiConfig::from_env().context("invalid ERP_* configuration")?;

    init_tracing(&config);

    tracing::info!(host = %config.host, port = %config.port, "Starting ERP API server");

    let database = DatabaseConfig::new(config.database_url.clone())
        .max_connections(config.database_max_connections);
    let pool = create_pool(database)
        .await
        .context("failed to connect to the database")?;

    run_migrations(&pool).await.context("failed to apply migrations")?;

    let app = create_router(AppState::postgres(pool, config.clone()));

    let addr: SocketAddr = config
        .server_addr()
        .parse()
        .with_context(|| format!("invalid listen address {}", config.server_addr()))?;

    tracing::info!(%addr, "Server listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// `RUST_LOG` wins over the configured level; JSON output on request
fn init_tracing(config: &ApiConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    if config.log_json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer().with_target(true)).init();
    }
}

/// Waits for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
