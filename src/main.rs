//! Session Auth server
//!
//! Connects to PostgreSQL, prepares the `users` table and serves the
//! `/api/auth` routes.

use anyhow::Context;
use session_auth::{create_routes, AuthConfig, AuthService, PgUserStore, ServerConfig};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    init_logging();

    let server = ServerConfig::from_env()?;
    let config = AuthConfig::from_env()?;
    config.validate()?;

    let pool = PgPoolOptions::new()
        .max_connections(server.max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&server.database_url)
        .await
        .context("Failed to connect to database")?;

    let store = PgUserStore::new(pool);
    store.migrate().await?;

    let auth = Arc::new(AuthService::new(Arc::new(store), config)?);
    let app = create_routes(auth).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(server.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", server.bind_addr))?;
    tracing::info!("Server listening on {}", server.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,tower_http=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutdown signal received");
}
