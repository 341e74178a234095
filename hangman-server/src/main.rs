use std::sync::Arc;
use tokio::signal;
use tracing::info;

use hangman_core::WordBank;
use hangman_persistence::{DatabaseManager, InMemorySnapshotStore, SnapshotStore};
use hangman_server::{
    config::{Config, PersistenceBackend},
    create_routes,
    room::{RoomManager, RoomSettings},
};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    info!("Starting hangman server...");

    let config = Config::new();

    let store: Arc<dyn SnapshotStore> = match config.persistence {
        PersistenceBackend::Sqlite => match DatabaseManager::connect(&config.database_url).await {
            Ok(db) => Arc::new(db.snapshot_repository()),
            Err(e) => {
                tracing::error!("Failed to connect to database and run migrations: {}", e);
                std::process::exit(1);
            }
        },
        PersistenceBackend::Memory => {
            info!("Keeping room snapshots in memory only");
            Arc::new(InMemorySnapshotStore::new())
        }
    };

    let rooms = Arc::new(RoomManager::new(
        store,
        Arc::new(WordBank::new()),
        RoomSettings {
            idle_policy: config.idle_policy(),
            channel_size: config.room_channel_size,
        },
    ));

    let routes = create_routes(rooms);

    info!("Server starting on {}:{}", config.host, config.port);

    let host = match config.host.parse::<std::net::IpAddr>() {
        Ok(host) => host,
        Err(e) => {
            tracing::error!("Invalid HOST {:?}: {}", config.host, e);
            std::process::exit(1);
        }
    };

    let (addr, server) = warp::serve(routes).bind_with_graceful_shutdown((host, config.port), async {
        // Wait for SIGINT (Ctrl+C) or SIGTERM
        #[cfg(unix)]
        {
            let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt())
                .expect("Failed to listen for SIGINT");
            let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())
                .expect("Failed to listen for SIGTERM");

            tokio::select! {
                _ = sigint.recv() => {
                    info!("Received SIGINT, shutting down gracefully...");
                }
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down gracefully...");
                }
            }
        }

        #[cfg(not(unix))]
        {
            signal::ctrl_c().await.expect("Failed to listen for ctrl+c");
            info!("Received Ctrl+C, shutting down gracefully...");
        }
    });

    info!(
        "Server started successfully on {}. Press Ctrl+C to stop.",
        addr
    );
    server.await;
    info!("Server shutdown complete.");
}
