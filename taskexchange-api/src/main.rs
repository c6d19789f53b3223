//! # Task Exchange API Server
//!
//! The API server for the Task Exchange referral-task marketplace:
//! users create tasks with escrowed point rewards, submit proof of
//! completion for each other's tasks, and settle rewards through
//! moderated submission decisions.
//!
//! ## Architecture
//!
//! Built with Axum on PostgreSQL:
//! - JWT authentication (access + refresh tokens)
//! - Atomic point settlement (status flip + ledger entry + balance update
//!   in one database transaction)
//! - Server-sent events for live notification delivery
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgresql://localhost/taskexchange \
//! JWT_SECRET=$(openssl rand -hex 32) \
//! cargo run -p taskexchange-api
//! ```

use taskexchange_api::{app, config::Config};
use taskexchange_shared::db::{migrations, pool};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskexchange_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "Task Exchange API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    let pool = pool::create_pool(pool::DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    })
    .await?;

    migrations::run_migrations(&pool).await?;

    let bind_address = config.bind_address();
    let state = app::AppState::new(pool, config);
    let router = app::build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");

    Ok(())
}

/// Resolves when the process receives Ctrl-C
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutdown signal received");
}
