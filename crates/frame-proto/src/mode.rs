use serde::{Deserialize, Serialize};

/// The three mutually exclusive screens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    AlbumArt,
    RecentTracks,
    Clock,
}

impl Mode {
    /// Next mode in tap order: AlbumArt → RecentTracks → Clock → AlbumArt.
    pub fn next(self) -> Self {
        match self {
            Self::AlbumArt => Self::RecentTracks,
            Self::RecentTracks => Self::Clock,
            Self::Clock => Self::AlbumArt,
        }
    }

    /// Whether this mode shows last.fm data and therefore polls for it.
    pub fn uses_tracks(self) -> bool {
        matches!(self, Self::AlbumArt | Self::RecentTracks)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::AlbumArt => "Album Art",
            Self::RecentTracks => "Recent Tracks",
            Self::Clock => "Clock",
        }
    }
}
