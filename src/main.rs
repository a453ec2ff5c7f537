//! Binary entry point: wires environment configuration, a `tracing`-backed
//! logger, the room/session registries, the background sweeper, and the
//! axum HTTP transport together.

mod config;
mod http;

use std::sync::Arc;

use config::Config;
use shoutwars_server::logger::{Level, Logger};
use shoutwars_server::room_registry::RoomRegistry;
use shoutwars_server::session::SessionRegistry;
use shoutwars_server::sweeper::Sweeper;

fn tracing_logger() -> Logger {
    Arc::new(|level, msg| match level {
        Level::Info => tracing::info!("{msg}"),
        Level::Warn => tracing::warn!("{msg}"),
        Level::Error => tracing::error!("{msg}"),
    })
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env().unwrap_or_else(|err| {
        tracing::error!(error = %err, "invalid configuration, falling back to defaults");
        Config::default()
    });

    let log = tracing_logger();
    let rooms = Arc::new(RoomRegistry::new(
        config.room_limit,
        config.lobby_lifetime,
        config.game_lifetime,
        log.clone(),
    ));
    let sessions = Arc::new(SessionRegistry::new(log.clone()));

    let sweeper = Sweeper::spawn(
        rooms.clone(),
        sessions.clone(),
        config.user_timeout,
        config.cleaner_interval,
        log.clone(),
    );

    let config = Arc::new(config);
    let router = http::build_router(http::AppState {
        rooms,
        sessions,
        config: config.clone(),
    });

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port))
        .await
        .unwrap_or_else(|err| panic!("failed to bind port {}: {err}", config.port));

    tracing::info!(port = config.port, auth_required = config.auth_required(), "ShoutWars backend starting");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    sweeper.shutdown().await;
    tracing::info!("ShoutWars backend stopped");
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install Ctrl+C handler");
}
