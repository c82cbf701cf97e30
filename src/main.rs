use anyhow::{Context, Result};
use axum::{routing::get, Router};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod config;
mod db;
mod models;
mod scanner;
mod services;

use config::AppConfig;
use db::MetadataStore;

pub struct AppState {
    pub config: AppConfig,
    pub store: MetadataStore,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let store = MetadataStore::new(config.paths.metadata_path());
        Self { config, store }
    }
}

/// API under `/api`, the video tree under `/videos`, the front-end for everything else
pub fn build_router(state: Arc<AppState>) -> Router {
    let videos = ServeDir::new(&state.config.paths.videos_dir);
    let public = ServeDir::new(&state.config.paths.public_dir);

    Router::new()
        .route("/health", get(|| async { "OK" }))
        .nest("/api", api::routes())
        .nest_service("/videos", videos)
        .fallback_service(public)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "videoteca=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = AppConfig::load();

    config
        .paths
        .ensure_dirs()
        .await
        .context("Failed to create library directories")?;

    config.log_config();

    let ip: IpAddr = config
        .bind_address
        .parse()
        .with_context(|| format!("Invalid bind address: {}", config.bind_address))?;
    let addr = SocketAddr::new(ip, config.port);

    let state = Arc::new(AppState::new(config));
    state
        .store
        .ensure_initialized()
        .await
        .context("Failed to initialize metadata file")?;

    let app = build_router(state);

    tracing::info!("Starting server on {}", addr);

    let shutdown_signal = async {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to install Ctrl+C handler: {}", e);
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
                    tracing::error!("Failed to install SIGTERM handler: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down..."),
            _ = terminate => tracing::info!("Received SIGTERM, shutting down..."),
        }
    };

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}
