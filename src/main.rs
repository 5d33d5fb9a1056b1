mod app;
mod config;
mod game;
mod http;
mod logs;
mod player;
mod reaper;

use log::info;
use tokio_util::sync::CancellationToken;

use crate::{app::construct_app, config::ServerConfig, logs::init_logger, reaper::Reaper};

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received. Preparing graceful exit...");
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    init_logger();

    let config = ServerConfig::from_env();
    let app = construct_app();

    info!("Starting ttt-server");

    let cancellation_token = CancellationToken::new();

    let reaper = Reaper::new(
        app.player_service.clone(),
        app.game_service.clone(),
        config.inactivity_threshold,
        config.timeout_policy,
    );
    let reaper_token = cancellation_token.clone();
    let reaper_interval = config.reaper_interval;
    let reaper_handle = tokio::spawn(async move {
        reaper.run(reaper_interval, reaper_token).await;
    });

    let on_shutdown = async move {
        shutdown_signal().await;
        cancellation_token.cancel();
    };

    http::run(app, config.http_port, on_shutdown).await;

    if let Err(e) = reaper_handle.await {
        log::error!("Reaper task failed: {}", e);
    }
}
