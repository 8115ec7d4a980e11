mod action;
mod app;
mod app_state;
mod component;
mod components;
mod core;
mod focus;
mod mpv;
mod theme;
mod widgets;

use ado_core::api::ApiClient;
use ado_core::config::Config;
use ado_core::library::Library;
use ado_core::playback::MediaEvent;
use ado_core::state::PersistentState;
use anyhow::Context;
use tokio::sync::mpsc;

use crate::app_state::AppState;
use crate::core::{PlayerCore, PlayerInput};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let data_dir = ado_core::platform::data_dir();
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("creating {}", data_dir.display()))?;

    let log_path = data_dir.join("ado-music.log");
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    // Allow RUST_LOG override; keep HTTP client internals quiet by default.
    let log_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "debug,hyper_util=warn,reqwest=warn,hyper=warn".to_string());
    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(log_filter.as_str())
        .with_ansi(false)
        .init();

    eprintln!("ado-music log: {}", log_path.display());
    tracing::info!("ado-music starting…");

    // ── Load config and remembered UI state ──────────────────────────────────
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("config unreadable, using defaults: {:#}", e);
            Config::default()
        }
    };
    let saved = PersistentState::load();
    let volume = saved.volume.unwrap_or(config.player.default_volume).clamp(0.0, 1.0);
    tracing::info!("API base URL: {}", config.api.base_url);

    let api = ApiClient::from_config(&config)?;
    let mut library = Library::new(config.admin.password.clone(), volume);
    library.set_filter(saved.filter);

    // ── Player core (owns mpv) ───────────────────────────────────────────────
    let (player_tx, player_rx) = mpsc::channel::<PlayerInput>(256);
    let (media_tx, media_rx) = mpsc::channel::<MediaEvent>(256);
    let player = PlayerCore::new(volume, player_tx.clone(), media_tx);
    tokio::spawn(async move {
        if let Err(e) = player.run(player_rx).await {
            tracing::error!("PlayerCore exited with error: {}", e);
        }
    });

    // ── Run TUI ──────────────────────────────────────────────────────────────
    let state = AppState::new(
        library,
        api,
        config.player.seek_step_secs,
        config.player.volume_step,
        log_path,
    );
    app::App::new(state, player_tx).run(media_rx).await?;

    Ok(())
}
