//! Resort Guest Registry - API Server Binary
//!
//! # Usage
//!
//! ```bash
//! # In-memory store (no database)
//! cargo run --bin guest-registry-api
//!
//! # PostgreSQL store
//! API_DATABASE_URL=postgres://localhost/guest_registry cargo run --bin guest-registry-api
//! ```
//!
//! # Environment Variables
//!
//! * `API_HOST` - Server host (default: 0.0.0.0)
//! * `API_PORT` - Server port (default: 8080)
//! * `API_DATABASE_URL` - PostgreSQL connection string; unset keeps guests in memory
//! * `API_MAX_CONNECTIONS` - Database pool size (default: 10)
//! * `API_LOG_LEVEL` - Log filter when `RUST_LOG` is unset (default: info)
//! * `API_COMPANION_REMOVAL_POLICY` - `promote_to_primary` or `cascade_delete`

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use domain_guest::{GuestService, GuestStorePort, InMemoryGuestStore};
use infra_db::{connect, DatabaseConfig, PostgresGuestStore};
use interface_api::{config::ApiConfig, create_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let config = ApiConfig::load().context("loading configuration")?;

    init_tracing(&config.log_level);

    info!(
        host = %config.host,
        port = %config.port,
        policy = %config.companion_removal_policy,
        "Starting guest registry API server"
    );

    let store = create_store(&config).await?;
    let service = GuestService::hydrate(store, config.service_config())
        .await
        .context("loading stored guests")?;
    info!(guests = service.guest_count().await, "Guest registry ready");

    let app = create_router(Arc::new(service), config.clone());

    let addr: SocketAddr = config
        .server_addr()
        .parse()
        .with_context(|| format!("invalid server address {}", config.server_addr()))?;

    info!(%addr, "Server listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber; `RUST_LOG` wins over the configured level
fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Connects to PostgreSQL when a URL is configured, otherwise keeps guests in memory
async fn create_store(config: &ApiConfig) -> anyhow::Result<Arc<dyn GuestStorePort>> {
    match &config.database_url {
        Some(url) => {
            info!("Connecting to database...");
            let pool = connect(&DatabaseConfig::new(url).max_connections(config.max_connections))
                .await
                .context("connecting to the guest database")?;
            info!("Database ready");
            Ok(Arc::new(PostgresGuestStore::new(pool)))
        }
        None => {
            warn!("API_DATABASE_URL not set; guests are kept in memory and lost on exit");
            Ok(Arc::new(InMemoryGuestStore::new()))
        }
    }
}

/// Waits for Ctrl+C or SIGTERM so in-flight requests can finish
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
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
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
