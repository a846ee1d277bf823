/// HTTP boundary: axum router over the scanner pipeline

pub mod routes;

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::config::Config;
use crate::scanner::Scanner;

#[derive(Clone)]
pub struct AppState {
    pub scanner: Arc<Scanner>,
    pub default_limit: usize,
    pub started_at: Instant,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(routes::health))
        .route("/api/scanner", get(routes::scanner))
        .route("/api/coin/:id", get(routes::coin_detail))
        .route("/api/portfolio/simulate", get(routes::portfolio_simulate))
        .route("/api/trending", get(routes::trending))
        .route("/api/global", get(routes::global))
        .route("/api/chart/:id", get(routes::chart))
        .route("/api/stats", get(routes::stats))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn serve(config: &Config, scanner: Arc<Scanner>) -> Result<()> {
    let state = AppState {
        scanner,
        default_limit: config.scanner.default_limit,
        started_at: Instant::now(),
    };
    let app = build_router(state);

    let addr = format!("{}:{}", config.server.bind, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!("🚀 API listening on http://{addr}/api/health");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("🛑 Shutdown signal received");
    }
}
