// Snake draft server entry point.
//
// Startup sequence:
// 1. Initialize tracing (stderr)
// 2. Load config, copying defaults/ on first run
// 3. Build the draft engine
// 4. Bind the WebSocket listener
// 5. Spawn WebSocket server and app logic tasks
// 6. Wait for Ctrl+C (or either task ending), then shut down

use snakedraft_core::draft::engine::DraftEngine;
use snakedraft_server::app;
use snakedraft_server::config;
use snakedraft_server::ws_server;

use anyhow::Context;
use tokio::sync::mpsc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;
    info!("Snake draft server starting up");

    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: range {}-{}, {} re-rolls, up to {} players",
        config.draft.min, config.draft.max, config.draft.initial_rerolls, config.draft.max_players
    );

    let engine = DraftEngine::new(config.draft.settings(), config.draft.max_players);
    let app_state = app::AppState::new(engine);

    let bind_addr = config.bind_addr();
    let listener = ws_server::bind(&bind_addr).await?;

    let (ws_tx, ws_rx) = mpsc::channel(256);

    let mut ws_handle = tokio::spawn(async move {
        if let Err(e) = ws_server::run(listener, ws_tx).await {
            error!("WebSocket server error: {}", e);
        }
    });

    let mut app_handle = tokio::spawn(async move {
        if let Err(e) = app::run(ws_rx, app_state).await {
            error!("Application loop error: {}", e);
        }
    });

    info!("Server ready on ws://{}", bind_addr);

    tokio::select! {
        res = tokio::signal::ctrl_c() => {
            if let Err(e) = res {
                error!("Failed to listen for Ctrl+C: {}", e);
            }
            info!("Shutdown requested");
        }
        _ = &mut ws_handle => error!("WebSocket server task ended unexpectedly"),
        _ = &mut app_handle => error!("Application task ended unexpectedly"),
    }

    ws_handle.abort();
    app_handle.abort();

    info!("Snake draft server shut down cleanly");
    Ok(())
}

/// Initialize tracing to stderr, filtered by `RUST_LOG`.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("snakedraft_server=info,snakedraft_core=info,warn")
        }))
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
