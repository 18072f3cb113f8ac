// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Action Guard Service
//!
//! Local companion service for the editorial site's browser shell. Before a
//! reader's comment, reply, reaction or report goes to the managed backend,
//! the shell asks `/admit` whether the action may proceed. Histories persist
//! across restarts when a storage path is configured.
//!
//! ## Configuration
//!
//! An optional JSON file named by `ACTION_GUARD_CONFIG`, then environment
//! overrides:
//!
//! - `BIND_ADDR`: Server bind address (default: 127.0.0.1:8787)
//! - `STORAGE_PATH`: History file (default: in-memory)
//! - `ID_SALT`: Salt for row ID obfuscation
//! - `ID_MIN_LENGTH`: Minimum encoded ID length (default: 8)

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use action_guard::{
    clock::{Clock, SystemClock},
    config::Config,
    handlers::{prune, router, AppState},
    storage::{FileStorage, MemoryStorage, Storage},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let config = Config::load()?;
    info!(
        bind_addr = %config.bind_addr,
        storage = ?config.storage.path,
        actions = config.policies.len(),
        "Starting action guard"
    );

    let storage: Arc<dyn Storage> = match &config.storage.path {
        Some(path) => Arc::new(FileStorage::open(path)),
        None => Arc::new(MemoryStorage::new()),
    };
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let state = Arc::new(AppState::new(config.clone(), storage, clock)?);

    // Spawn prune task
    let prune_state = state.clone();
    let prune_interval = config.storage.prune_interval();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(prune_interval);
        loop {
            interval.tick().await;
            prune(prune_state.clone()).await;
        }
    });

    let app = router(state);

    // Start server
    let addr: SocketAddr = config.bind_addr.parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "Server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
