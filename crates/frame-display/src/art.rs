//! Artwork through the resizing proxy: fetch, decode, round the corners.

use image::ImageFormat;
use tracing::debug;

use frame_proto::artwork::{proxy_url, ArtError, ArtFormat, ArtSource, Artwork};
use frame_proto::config::ArtConfig;
use frame_proto::remote::RemoteClient;

use crate::theme::CORNER_FILL;

pub struct ProxyArtFetcher {
    remote: RemoteClient,
    config: ArtConfig,
}

impl ProxyArtFetcher {
    pub fn new(remote: RemoteClient, config: ArtConfig) -> Self {
        Self { remote, config }
    }
}

impl ArtSource for ProxyArtFetcher {
    async fn fetch(&mut self, art_url: &str) -> Result<Artwork, ArtError> {
        let url = proxy_url(&self.config, art_url)?;
        let bytes = self.remote.get_bytes(url).await?;
        debug!("[art] {} bytes for {}", bytes.len(), art_url);

        let mut art = decode(&bytes, ArtFormat::from_source_url(art_url))?;
        art.round_corners(self.config.corner_radius, CORNER_FILL);
        Ok(art)
    }
}

pub fn decode(bytes: &[u8], format: ArtFormat) -> Result<Artwork, ArtError> {
    let format = match format {
        ArtFormat::Png => ImageFormat::Png,
        ArtFormat::Jpeg => ImageFormat::Jpeg,
    };
    let rgb = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| ArtError::Decode(e.to_string()))?
        .to_rgb8();
    let (width, height) = rgb.dimensions();
    Artwork::from_rgb(width, height, rgb.into_raw())
        .ok_or_else(|| ArtError::Decode(format!("bad {width}x{height} buffer")))
}
