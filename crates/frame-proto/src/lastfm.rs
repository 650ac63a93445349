//! last.fm-backed [`TrackSource`].

use reqwest::Url;
use tracing::{debug, info};

use crate::config::LastFmConfig;
use crate::remote::RemoteClient;
use crate::track::{parse_recent_tracks, recent_tracks_url, RefreshError, Track, TrackSource};

pub struct LastFmTracks {
    remote: RemoteClient,
    api_base: Url,
    api_key: String,
    username: String,
}

impl LastFmTracks {
    pub fn new(remote: RemoteClient, config: &LastFmConfig) -> anyhow::Result<Self> {
        let api_base = Url::parse(&config.api_base)
            .map_err(|e| anyhow::anyhow!("invalid lastfm.api_base {:?}: {}", config.api_base, e))?;
        info!("[lastfm] tracking user {}", config.username);
        Ok(Self {
            remote,
            api_base,
            api_key: config.api_key.clone(),
            username: config.username.clone(),
        })
    }
}

impl TrackSource for LastFmTracks {
    async fn fetch_recent(&mut self, limit: usize) -> Result<Vec<Track>, RefreshError> {
        let url = recent_tracks_url(&self.api_base, &self.api_key, &self.username, limit);
        let body = self.remote.get_text(url).await?;
        let tracks = parse_recent_tracks(&body)?;
        if tracks.is_empty() {
            return Err(RefreshError::Empty);
        }
        debug!(
            "[lastfm] {} tracks, first: {} – {}",
            tracks.len(),
            tracks[0].artist,
            tracks[0].name
        );
        Ok(tracks)
    }
}
