// Framework bootstrap for the grid server runtime.

use std::io::Result;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{Router, routing::get};
use tokio::sync::mpsc;

use crate::frameworks::config::Config;
use crate::interface_adapters::net::ws_handler;
use crate::interface_adapters::state::AppState;
use crate::use_cases::{GameCore, orchestrator};

fn init_runtime() {
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

pub async fn run(listener: tokio::net::TcpListener, config: Config) -> Result<()> {
    let address = listener.local_addr()?;

    let board = crate::frameworks::board_loader::load(&config.board_path).map_err(|e| {
        tracing::error!(error = %e, board_path = %config.board_path.display(), "failed to load board");
        std::io::Error::other(e)
    })?;

    let game = GameCore::new(board, config.spawn.clone());
    let (actor_tx, actor_rx) = mpsc::channel(1024);
    tokio::spawn(orchestrator::run(game, actor_rx, config.broadcast_interval));

    let state = Arc::new(AppState { actor_tx });
    let app = Router::new().route("/ws", get(ws_handler)).with_state(state);

    tracing::info!(%address, board = %config.board_path.display(), "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .inspect_err(|e| {
            tracing::error!(error = %e, "server error");
        })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        let mut signal = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler");
        signal.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    tracing::info!("shutdown signal received");
}

pub async fn run_with_config(board_path_override: Option<PathBuf>) -> Result<()> {
    init_runtime();

    let config = Config::from_env(board_path_override);
    let address = SocketAddr::new(config.host.parse().map_err(std::io::Error::other)?, config.port);

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .inspect_err(|e| {
            tracing::error!(%address, error = %e, "failed to bind");
        })?;

    run(listener, config).await
}
