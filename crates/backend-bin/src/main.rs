// ============================
// crates/backend-bin/src/main.rs
// ============================
//! Backend server for the carelink telemedicine chat.
use carelink_backend_lib::{
    config::Settings, provider::HttpProvider, storage::SqliteStorage, ws_router, AppState,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::time::{interval, Duration};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .init();

    info!("Starting carelink room coordinator...");

    let config = Settings::load()?;
    debug!("Configuration loaded");

    if config.auth.token_secret.is_empty() {
        return Err("APP_AUTH__TOKEN_SECRET must be set".into());
    }

    let storage = SqliteStorage::new(&config.database.path)?;
    info!("Storage initialized at {}", config.database.path.display());

    let provider = Arc::new(HttpProvider::new(&config.provider)?);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let state = Arc::new(AppState::new(storage, config, provider));
    info!("Application state initialized");

    // Periodic sweep of expired cache artifacts
    let cache = state.cache.clone();
    tokio::spawn(async move {
        let mut interval = interval(Duration::from_secs(15 * 60));
        loop {
            interval.tick().await;
            debug!("Running scheduled cache sweep");
            cache.sweep_expired();
        }
    });
    debug!("Cache sweep task scheduled");

    let app = ws_router::create_router(state);
    info!("Router created");

    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {addr}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
