//! The terminal as a frame display.
//!
//! `TerminalDisplay` keeps the album background and caption between calls so
//! that every draw can recompose the full screen; `TerminalGuard` owns the
//! raw-mode / alternate-screen lifetime.

use std::io;

use chrono::{DateTime, FixedOffset};
use ratatui::crossterm::{
    cursor::Show,
    event::{
        DisableMouseCapture, EnableMouseCapture, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};
use ratatui::{backend::Backend, Frame, Terminal};
use tracing::debug;

use frame_proto::artwork::Artwork;
use frame_proto::display::DisplayRenderer;
use frame_proto::track::Track;

use crate::views::{album, clock, recent};

// ── Terminal lifetime ─────────────────────────────────────────────────────────

/// Raw mode + alternate screen + mouse capture, undone on drop. Key release
/// reporting is switched on where the terminal supports it.
pub struct TerminalGuard {
    key_releases: bool,
}

impl TerminalGuard {
    pub fn enter() -> anyhow::Result<Self> {
        enable_raw_mode()?;
        let mut guard = Self {
            key_releases: false,
        };
        execute!(io::stdout(), EnterAlternateScreen, EnableMouseCapture)?;
        if supports_keyboard_enhancement().unwrap_or(false) {
            execute!(
                io::stdout(),
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
            guard.key_releases = true;
        }
        debug!(
            "terminal: raw mode + alternate screen entered (key releases: {})",
            guard.key_releases
        );
        Ok(guard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if self.key_releases {
            let _ = execute!(io::stdout(), PopKeyboardEnhancementFlags);
        }
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture, Show);
    }
}

// ── DisplayRenderer ───────────────────────────────────────────────────────────

pub struct TerminalDisplay<B: Backend> {
    terminal: Terminal<B>,
    /// Album background; dropped when another screen takes over.
    artwork: Option<Artwork>,
    caption: Option<Track>,
}

impl<B: Backend> TerminalDisplay<B> {
    pub fn new(terminal: Terminal<B>) -> Self {
        Self {
            terminal,
            artwork: None,
            caption: None,
        }
    }

    fn present<F: FnOnce(&mut Frame)>(&mut self, draw: F) -> anyhow::Result<()> {
        self.terminal
            .draw(draw)
            .map_err(|e| anyhow::anyhow!("terminal draw failed: {e}"))?;
        Ok(())
    }

    fn present_album(&mut self) -> anyhow::Result<()> {
        let art = self.artwork.as_ref();
        let caption = self.caption.as_ref();
        self.terminal
            .draw(|f| album::draw(f, art, caption))
            .map_err(|e| anyhow::anyhow!("terminal draw failed: {e}"))?;
        Ok(())
    }

    fn leave_album(&mut self) {
        self.artwork = None;
        self.caption = None;
    }
}

impl<B: Backend> DisplayRenderer for TerminalDisplay<B> {
    fn draw_artwork(&mut self, art: &Artwork) -> anyhow::Result<()> {
        self.artwork = Some(art.clone());
        // The old caption belongs to the previous track.
        self.caption = None;
        self.present_album()
    }

    fn draw_album_caption(&mut self, track: &Track) -> anyhow::Result<()> {
        self.caption = Some(track.clone());
        self.present_album()
    }

    fn draw_album_placeholder(&mut self) -> anyhow::Result<()> {
        self.leave_album();
        self.present(album::draw_placeholder)
    }

    fn draw_recent_tracks(&mut self, tracks: &[Track]) -> anyhow::Result<()> {
        self.leave_album();
        self.present(|f| recent::draw(f, tracks))
    }

    fn draw_clock(&mut self, now: &DateTime<FixedOffset>) -> anyhow::Result<()> {
        self.leave_album();
        self.present(|f| clock::draw(f, now))
    }
}
