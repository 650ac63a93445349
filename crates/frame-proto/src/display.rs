//! The presentation seam. Implementations compose the whole surface on every
//! call (clear, draw, present) and never perform network I/O.

use chrono::{DateTime, FixedOffset};

use crate::artwork::Artwork;
use crate::track::Track;

pub trait DisplayRenderer {
    /// Replace the album background with `art` and present it.
    fn draw_artwork(&mut self, art: &Artwork) -> anyhow::Result<()>;

    /// Album screen: caption strip for `track` over the current background.
    fn draw_album_caption(&mut self, track: &Track) -> anyhow::Result<()>;

    /// Album screen before any track is known.
    fn draw_album_placeholder(&mut self) -> anyhow::Result<()>;

    fn draw_recent_tracks(&mut self, tracks: &[Track]) -> anyhow::Result<()>;

    fn draw_clock(&mut self, now: &DateTime<FixedOffset>) -> anyhow::Result<()>;
}
