use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;

use crate::config::Settings;
use crate::services::{ClientService, EntityStore, MemoryStore, MongoStore};
use crate::{build_router, AppState};

/// Pick the configured store: MongoDB when `database` is set, otherwise an
/// in-process store that lives as long as the server.
pub async fn open_store(settings: &Settings) -> anyhow::Result<Arc<dyn EntityStore>> {
    match &settings.database {
        Some(db) => {
            tracing::info!(database = %db.name, "Connecting to MongoDB");
            let store = MongoStore::connect(&db.uri, &db.name)
                .await
                .context("Failed to connect to MongoDB")?;
            store
                .initialize_indexes()
                .await
                .context("Failed to create indexes")?;
            Ok(Arc::new(store))
        }
        None => {
            tracing::warn!("No database configured, records are kept in memory");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

pub async fn run(settings: &Settings, port: u16) -> anyhow::Result<()> {
    let store = open_store(settings).await?;
    let clients = ClientService::new(store, settings.tokens.lifetimes());
    let state = AppState::new(clients, settings.require_shared_secret()?);

    let app = build_router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!(address = %addr, "Listening");

    service_core::axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Service shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
