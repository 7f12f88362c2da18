//! Agora Server - standalone entry point for the Agora debate API
//!
//! A thin wrapper around `agora-api`; all configuration comes from the
//! environment (`AGORA_*`, `DATABASE_URL`, `RUST_LOG`).

use anyhow::{Context, Result};
use agora_api::{AgoraServer, ServerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    agora_api::init_tracing();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting Agora server");

    let config = ServerConfig::from_env();
    tracing::debug!(?config, "Server configuration loaded");

    let server = AgoraServer::new(config).await.map_err(|e| {
        tracing::error!("Failed to initialize server: {}", e);
        e
    })
    .context("server initialization")?;

    server
        .run()
        .await
        .context("server terminated with an error")?;

    Ok(())
}
