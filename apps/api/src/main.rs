mod config;
mod errors;
mod markdown;
mod profile;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, StorageBackend};
use crate::profile::storage::{FileStorage, MemoryStorage, ProfileStorage};
use crate::profile::store::ProfileStore;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Coach API v{}", env!("CARGO_PKG_VERSION"));

    // Load the profile once; every request works on this in-memory copy
    let storage: Box<dyn ProfileStorage> = match config.storage {
        StorageBackend::File => {
            info!("Profile storage at {}", config.profile_dir.display());
            Box::new(FileStorage::new(&config.profile_dir))
        }
        StorageBackend::Memory => {
            info!("Profile storage in memory; nothing survives a restart");
            Box::new(MemoryStorage::new())
        }
    };
    let mut store = ProfileStore::new(storage);
    store.load();

    let state = AppState::new(store, config.clone());

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // UI shell is served from a different origin

    let addr: SocketAddr = format!("127.0.0.1:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
