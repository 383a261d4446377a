//! dine-server: restaurant table ordering backend
//!
//! Long-running service that:
//! - Issues anonymous ordering sessions to customers scanning a table code
//! - Serves menus, carts and checkout
//! - Lets staff follow orders, settle and release tables

use std::time::Duration;

use dine_server::{AppState, Config, api, logger};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // Load .env file
    let _ = dotenvy::dotenv();

    logger::init_from_env();

    let config = Config::from_env()?;

    tracing::info!("Starting dine-server (env: {})", config.environment);

    let state = AppState::new(&config).await?;

    // Periodic expired-session sweep
    if config.cleanup_interval_secs > 0 {
        let sessions = state.sessions.clone();
        let period = Duration::from_secs(config.cleanup_interval_secs);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // First tick fires immediately
            interval.tick().await;
            loop {
                interval.tick().await;
                match sessions.cleanup_expired().await {
                    Ok(removed) => tracing::debug!(removed, "Session sweep finished"),
                    Err(e) => {
                        let e: shared::error::AppError = e.into();
                        tracing::warn!(error = %e, "Session sweep failed");
                    }
                }
            }
        });
    }

    let app = api::create_router(state);

    let http_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&http_addr).await?;
    tracing::info!("dine-server HTTP listening on {http_addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("dine-server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
    }
}
