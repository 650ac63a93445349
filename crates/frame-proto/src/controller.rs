//! ModeController: single owner of the screen mode, the recent-tracks cache
//! and the refresh schedule.
//!
//! Runs on one cooperative loop; the binary calls `tick()` at a fixed cadence.
//! Each tick does at most one of:
//!   1. tap        → advance the mode, re-arm the schedule, forced render
//!   2. due + data → refresh from last.fm, render if there is something new
//!   3. due + clock → redraw the clock, no network
//!   4. otherwise  → count the tick
//!
//! A tap always wins over a due refresh in the same tick. Refresh failures are
//! absorbed here: the stale cache stays on screen, the scheduler backs off, and
//! a run of failures past the retry ceiling triggers one reconnect on the next
//! scheduled refresh.

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::artwork::ArtSource;
use crate::clock::LocalClock;
use crate::config::Config;
use crate::display::DisplayRenderer;
use crate::link::Link;
use crate::mode::Mode;
use crate::schedule::{FailureAction, RefreshPolicy, RefreshScheduler, RefreshState};
use crate::touch::{TouchError, TouchInput, TouchSurface};
use crate::track::{RefreshError, Track, TrackSource};

// ── Settings ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ControllerSettings {
    /// Tracks requested per refresh.
    pub recent_limit: usize,
    pub policy: RefreshPolicy,
    pub initial_mode: Mode,
}

impl ControllerSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            recent_limit: config.lastfm.recent_limit,
            policy: RefreshPolicy::from_config(&config.polling),
            initial_mode: config.polling.initial_mode,
        }
    }
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

// ── Public types ──────────────────────────────────────────────────────────────

/// The (name, artist) pair last put on the album screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShownTrack {
    pub name: String,
    pub artist: String,
}

impl ShownTrack {
    fn of(track: &Track) -> Self {
        Self {
            name: track.name.clone(),
            artist: track.artist.clone(),
        }
    }

    pub fn matches(&self, track: &Track) -> bool {
        self.name == track.name && self.artist == track.artist
    }
}

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing due.
    Idle,
    /// A tap switched to this mode.
    ModeChanged(Mode),
    /// Scheduled refresh succeeded; `rendered` is false when the screen was
    /// already up to date.
    Refreshed { rendered: bool },
    /// Scheduled refresh failed; the previous cache is still shown.
    RefreshFailed { reconnected: bool },
    ClockRedrawn,
}

impl TickOutcome {
    pub fn touched(self) -> bool {
        matches!(self, Self::ModeChanged(_))
    }
}

enum Fetch {
    Fresh,
    Stale { reconnected: bool },
}

/// How a failed fetch is charged to the schedule.
#[derive(Clone, Copy)]
enum OnFailure {
    /// Full policy: back off, or reconnect past the retry ceiling.
    Escalate,
    /// Count it and back off only; the user is waiting for a screen.
    Defer,
}

// ── ModeController ────────────────────────────────────────────────────────────

pub struct ModeController<S, A, D, T, L> {
    tracks: S,
    art: A,
    display: D,
    touch: TouchInput<T>,
    link: L,
    clock: LocalClock,
    mode: Mode,
    /// Most recent first. Replaced wholesale on success, kept on failure.
    cache: Vec<Track>,
    last_shown: Option<ShownTrack>,
    schedule: RefreshScheduler,
    /// Ticks since the last refresh or forced render (diagnostic only; the
    /// schedule's deadline decides when to poll).
    ticks_since_refresh: u64,
    recent_limit: usize,
}

impl<S, A, D, T, L> ModeController<S, A, D, T, L>
where
    S: TrackSource,
    A: ArtSource,
    D: DisplayRenderer,
    T: TouchSurface,
    L: Link,
{
    pub fn new(
        tracks: S,
        art: A,
        display: D,
        touch: TouchInput<T>,
        link: L,
        clock: LocalClock,
        settings: ControllerSettings,
    ) -> Self {
        Self {
            tracks,
            art,
            display,
            touch,
            link,
            clock,
            mode: settings.initial_mode,
            cache: Vec::new(),
            last_shown: None,
            schedule: RefreshScheduler::new(settings.policy, Instant::now()),
            ticks_since_refresh: 0,
            recent_limit: settings.recent_limit,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn cache(&self) -> &[Track] {
        &self.cache
    }

    pub fn last_shown(&self) -> Option<&ShownTrack> {
        self.last_shown.as_ref()
    }

    pub fn error_count(&self) -> u8 {
        self.schedule.error_count()
    }

    pub fn refresh_state(&self) -> RefreshState {
        self.schedule.state()
    }

    pub fn next_refresh_due(&self) -> Instant {
        self.schedule.next_due()
    }

    pub fn ticks_since_refresh(&self) -> u64 {
        self.ticks_since_refresh
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn clock(&self) -> &LocalClock {
        &self.clock
    }

    /// Startup: one refresh whatever the mode, then draw the initial screen.
    /// The album screen shows the latest track even when it is not playing.
    pub async fn start(&mut self) {
        info!("ModeController: starting in {} mode", self.mode.label());
        if let Fetch::Fresh = self.refresh_now(OnFailure::Defer).await {
            if let Some(first) = self.cache.first() {
                info!("ModeController: latest is {} by {}", first.name, first.artist);
            }
        }
        self.render_mode().await;
    }

    /// Switch mode programmatically, with the same forced render as a tap.
    pub async fn set_mode(&mut self, mode: Mode) {
        if mode == self.mode {
            return;
        }
        self.mode = mode;
        info!("ModeController: mode set to {}", self.mode.label());
        self.enter_mode().await;
    }

    /// One iteration of the polling loop. Only a closed touch surface is an
    /// error; everything else is absorbed.
    pub async fn tick(&mut self) -> Result<TickOutcome, TouchError> {
        if self.touch.poll_tap().await? {
            self.mode = self.mode.next();
            info!("ModeController: mode changed to {}", self.mode.label());
            self.enter_mode().await;
            return Ok(TickOutcome::ModeChanged(self.mode));
        }

        let now = Instant::now();
        if !self.schedule.is_due(now) {
            self.ticks_since_refresh = self.ticks_since_refresh.saturating_add(1);
            return Ok(TickOutcome::Idle);
        }

        if !self.mode.uses_tracks() {
            self.ticks_since_refresh = 0;
            self.schedule.rearm(now);
            self.render_clock();
            return Ok(TickOutcome::ClockRedrawn);
        }

        Ok(self.scheduled_refresh().await)
    }

    // ── refresh ───────────────────────────────────────────────────────────────

    async fn scheduled_refresh(&mut self) -> TickOutcome {
        debug!(
            "ModeController: scheduled refresh after {} ticks",
            self.ticks_since_refresh
        );
        if let Fetch::Stale { reconnected } = self.refresh_now(OnFailure::Escalate).await {
            return TickOutcome::RefreshFailed { reconnected };
        }

        let rendered = match self.mode {
            Mode::AlbumArt => self.show_if_new().await,
            // The list is redrawn on every successful poll, changed or not.
            Mode::RecentTracks => {
                self.render_recent();
                true
            }
            Mode::Clock => false,
        };
        TickOutcome::Refreshed { rendered }
    }

    /// Fetch once and replace the cache, or keep it and charge the failure.
    async fn refresh_now(&mut self, on_failure: OnFailure) -> Fetch {
        self.ticks_since_refresh = 0;
        self.schedule.begin_refresh();

        let result = match self.tracks.fetch_recent(self.recent_limit).await {
            Ok(tracks) if tracks.is_empty() => Err(RefreshError::Empty),
            other => other,
        };

        match result {
            Ok(tracks) => {
                self.schedule.record_success(Instant::now());
                self.cache = tracks;
                Fetch::Fresh
            }
            Err(e) => {
                warn!(
                    "ModeController: refresh failed, keeping {} cached tracks: {}",
                    self.cache.len(),
                    e
                );
                let reconnected = match on_failure {
                    OnFailure::Escalate => self.handle_failure().await,
                    OnFailure::Defer => {
                        self.schedule.defer_failure(Instant::now());
                        false
                    }
                };
                Fetch::Stale { reconnected }
            }
        }
    }

    /// Returns true when the failure escalated to a reconnect.
    async fn handle_failure(&mut self) -> bool {
        match self.schedule.record_failure(Instant::now()) {
            FailureAction::Backoff(pause) => {
                debug!(
                    "ModeController: failure {}, next attempt delayed by {:?}",
                    self.schedule.error_count(),
                    pause
                );
                false
            }
            FailureAction::Reconnect => {
                warn!(
                    "ModeController: {} consecutive failures, reconnecting",
                    self.schedule.error_count()
                );
                let report = self.link.reassociate().await;
                if let Some(correction) = report.clock_correction {
                    self.clock.apply_correction(correction);
                }
                info!(
                    "ModeController: reconnect done (reachable={}, time_synced={})",
                    report.reachable,
                    report.clock_correction.is_some()
                );
                self.schedule.reconnected(Instant::now());
                true
            }
        }
    }

    // ── rendering ─────────────────────────────────────────────────────────────

    /// Forced render after a mode change. Data screens refresh once first so
    /// the user sees current content without waiting out the countdown. A
    /// failure here never reconnects inline; the next scheduled refresh does.
    async fn enter_mode(&mut self) {
        self.ticks_since_refresh = 0;
        self.schedule.rearm(Instant::now());
        if self.mode.uses_tracks() {
            self.refresh_now(OnFailure::Defer).await;
        }
        self.render_mode().await;
    }

    async fn render_mode(&mut self) {
        match self.mode {
            Mode::Clock => self.render_clock(),
            Mode::RecentTracks => self.render_recent(),
            Mode::AlbumArt => match self.cache.first().cloned() {
                Some(track) => self.show_album(track).await,
                None => log_render("album placeholder", self.display.draw_album_placeholder()),
            },
        }
    }

    /// Album screen on a scheduled refresh: only a now-playing track that
    /// differs from what is already shown gets drawn.
    async fn show_if_new(&mut self) -> bool {
        let Some(current) = self.cache.first() else {
            return false;
        };
        if !current.now_playing {
            return false;
        }
        if self
            .last_shown
            .as_ref()
            .is_some_and(|shown| shown.matches(current))
        {
            return false;
        }
        let track = current.clone();
        info!("ModeController: now playing {} by {}", track.name, track.artist);
        self.show_album(track).await;
        true
    }

    /// Artwork first (best effort), then the caption on top of whatever
    /// background the surface holds.
    async fn show_album(&mut self, track: Track) {
        if track.has_art() {
            match self.art.fetch(&track.art_url).await {
                Ok(art) => log_render("artwork", self.display.draw_artwork(&art)),
                Err(e) => warn!(
                    "ModeController: artwork unavailable for {} by {}: {}",
                    track.name, track.artist, e
                ),
            }
        }
        log_render("album caption", self.display.draw_album_caption(&track));
        self.last_shown = Some(ShownTrack::of(&track));
    }

    fn render_recent(&mut self) {
        log_render("recent tracks", self.display.draw_recent_tracks(&self.cache));
    }

    fn render_clock(&mut self) {
        let now = self.clock.now();
        log_render("clock", self.display.draw_clock(&now));
    }
}

fn log_render(what: &str, result: anyhow::Result<()>) {
    if let Err(e) = result {
        warn!("ModeController: drawing {} failed: {:#}", what, e);
    }
}
