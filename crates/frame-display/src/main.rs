mod art;
mod network;
mod ntp;
mod screen;
mod theme;
mod touch_panel;
mod views;

use std::io;

use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::time::MissedTickBehavior;
use tracing::{info, trace, warn};

use frame_proto::clock::LocalClock;
use frame_proto::config::Config;
use frame_proto::controller::{ControllerSettings, ModeController};
use frame_proto::lastfm::LastFmTracks;
use frame_proto::link::Link;
use frame_proto::platform;
use frame_proto::remote::RemoteClient;
use frame_proto::touch::{TouchError, TouchInput};

use crate::art::ProxyArtFetcher;
use crate::network::NetworkLink;
use crate::screen::{TerminalDisplay, TerminalGuard};
use crate::touch_panel::TerminalTouch;

const DEFAULT_LOG_FILTER: &str =
    "info,frame_proto=debug,frame_display=debug,hyper_util=warn,reqwest=warn,hyper=warn";

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let data_dir = platform::data_dir();
    std::fs::create_dir_all(&data_dir)?;
    let log_path = data_dir.join("frame.log");

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    // The terminal belongs to the screen, so logs go to a file. RUST_LOG overrides.
    let log_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string());
    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(log_filter.as_str())
        .with_ansi(false)
        .init();

    eprintln!("nowplaying-frame log: {}", log_path.display());
    info!("nowplaying-frame starting… ({})", platform::user_agent());

    // ── Load config ──────────────────────────────────────────────────────────
    let config = Config::load().unwrap_or_else(|e| {
        warn!("config unreadable, using defaults: {:#}", e);
        Config::default()
    });
    config.validate()?;
    let offset = config.clock.utc_offset()?;

    // ── Remote collaborators ─────────────────────────────────────────────────
    let remote = RemoteClient::new(config.network.timeout())?;
    let tracks = LastFmTracks::new(remote.clone(), &config.lastfm)?;
    let art = ProxyArtFetcher::new(remote, config.art.clone());
    let mut link = NetworkLink::from_config(&config)?;

    // ── Bring the link up and set the clock before the first draw ────────────
    let mut clock = LocalClock::new(offset);
    let startup = link.reassociate().await;
    if !startup.reachable {
        warn!("last.fm not reachable at startup; continuing with retries");
    }
    if let Some(correction) = startup.clock_correction {
        clock.apply_correction(correction);
    }

    // ── Screen + touch ───────────────────────────────────────────────────────
    let guard = TerminalGuard::enter()?;
    let display = TerminalDisplay::new(Terminal::new(CrosstermBackend::new(io::stdout()))?);
    let touch = TouchInput::new(TerminalTouch::new(), &config.touch);

    let mut controller = ModeController::new(
        tracks,
        art,
        display,
        touch,
        link,
        clock,
        ControllerSettings::from_config(&config),
    );

    // ── Run ──────────────────────────────────────────────────────────────────
    controller.start().await;

    let mut ticker = tokio::time::interval(config.polling.tick_period());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let result = loop {
        ticker.tick().await;
        match controller.tick().await {
            Ok(outcome) => trace!("tick: {:?}", outcome),
            Err(TouchError::Closed) => {
                info!("quit requested");
                break Ok(());
            }
            Err(e) => break Err(anyhow::Error::from(e)),
        }
    };

    drop(guard);
    info!("nowplaying-frame stopped");
    result
}
