//! Album artwork: the decoded raster, the proxy request, and the fetch seam.

use reqwest::Url;

use crate::config::ArtConfig;
use crate::remote::FetchError;

/// A decoded RGB8 image, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artwork {
    width: u32,
    height: u32,
    rgb: Vec<u8>,
}

impl Artwork {
    /// Wrap a raw RGB8 buffer. Returns `None` when the buffer length does not
    /// match the dimensions.
    pub fn from_rgb(width: u32, height: u32, rgb: Vec<u8>) -> Option<Self> {
        if rgb.len() != width as usize * height as usize * 3 {
            return None;
        }
        Some(Self { width, height, rgb })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn as_rgb(&self) -> &[u8] {
        &self.rgb
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let i = (y as usize * self.width as usize + x as usize) * 3;
        [self.rgb[i], self.rgb[i + 1], self.rgb[i + 2]]
    }

    fn set_pixel(&mut self, x: u32, y: u32, color: [u8; 3]) {
        let i = (y as usize * self.width as usize + x as usize) * 3;
        self.rgb[i..i + 3].copy_from_slice(&color);
    }

    /// Paint everything outside a rounded rectangle of `radius` with `fill`.
    pub fn round_corners(&mut self, radius: u32, fill: [u8; 3]) {
        let r = radius.min(self.width / 2).min(self.height / 2);
        if r == 0 {
            return;
        }
        let rf = r as f32;
        for dy in 0..r {
            for dx in 0..r {
                // Distance from the corner circle's centre, sampled at pixel centres.
                let cx = rf - (dx as f32 + 0.5);
                let cy = rf - (dy as f32 + 0.5);
                if cx * cx + cy * cy <= rf * rf {
                    continue;
                }
                let right = self.width - 1 - dx;
                let bottom = self.height - 1 - dy;
                self.set_pixel(dx, dy, fill);
                self.set_pixel(right, dy, fill);
                self.set_pixel(dx, bottom, fill);
                self.set_pixel(right, bottom, fill);
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ArtError {
    #[error("no artwork URL")]
    NoUrl,
    #[error("invalid artwork URL: {0}")]
    BadUrl(String),
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("decode failed: {0}")]
    Decode(String),
}

/// Encoded image formats the proxy can hand back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtFormat {
    Png,
    Jpeg,
}

impl ArtFormat {
    /// The proxy keeps the source format, so the source URL's suffix decides
    /// the decoder.
    pub fn from_source_url(url: &str) -> Self {
        if url.to_lowercase().contains(".png") {
            Self::Png
        } else {
            Self::Jpeg
        }
    }
}

/// Build the resizing-proxy request for `art_url`.
pub fn proxy_url(config: &ArtConfig, art_url: &str) -> Result<Url, ArtError> {
    if art_url.is_empty() {
        return Err(ArtError::NoUrl);
    }
    let size = config.size.to_string();
    let contrast = config.contrast.to_string();
    Url::parse_with_params(
        &config.proxy_base,
        &[
            ("url", art_url),
            ("w", size.as_str()),
            ("h", size.as_str()),
            ("con", contrast.as_str()),
        ],
    )
    .map_err(|e| ArtError::BadUrl(e.to_string()))
}

/// Resolves an artwork URL to a ready-to-show image.
#[allow(async_fn_in_trait)]
pub trait ArtSource {
    async fn fetch(&mut self, art_url: &str) -> Result<Artwork, ArtError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn white(w: u32, h: u32) -> Artwork {
        Artwork::from_rgb(w, h, vec![255; (w * h * 3) as usize]).unwrap()
    }

    #[test]
    fn test_from_rgb_checks_length() {
        assert!(Artwork::from_rgb(2, 2, vec![0; 12]).is_some());
        assert!(Artwork::from_rgb(2, 2, vec![0; 11]).is_none());
    }

    #[test]
    fn test_round_corners() {
        let mut art = white(40, 40);
        art.round_corners(10, [0, 0, 0]);
        for (x, y) in [(0, 0), (39, 0), (0, 39), (39, 39)] {
            assert_eq!(art.pixel(x, y), [0, 0, 0], "corner ({x},{y})");
        }
        // Edge midpoints and centre are untouched.
        for (x, y) in [(20, 0), (0, 20), (20, 20), (39, 20), (20, 39)] {
            assert_eq!(art.pixel(x, y), [255, 255, 255], "point ({x},{y})");
        }
        // Just inside the arc.
        assert_eq!(art.pixel(5, 5), [255, 255, 255]);
    }

    #[test]
    fn test_round_corners_zero_radius_is_noop() {
        let mut art = white(4, 4);
        art.round_corners(0, [0, 0, 0]);
        assert_eq!(art, white(4, 4));
    }

    #[test]
    fn test_format_from_url() {
        assert_eq!(ArtFormat::from_source_url("http://x/a.PNG"), ArtFormat::Png);
        assert_eq!(ArtFormat::from_source_url("http://x/a.jpg"), ArtFormat::Jpeg);
        assert_eq!(ArtFormat::from_source_url("http://x/a"), ArtFormat::Jpeg);
    }

    #[test]
    fn test_proxy_url() {
        let url = proxy_url(&ArtConfig::default(), "https://lastfm.freetls.fastly.net/i/u/300x300/abc.jpg")
            .unwrap();
        assert_eq!(url.host_str(), Some("wsrv.nl"));
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert!(pairs.contains(&(
            "url".into(),
            "https://lastfm.freetls.fastly.net/i/u/300x300/abc.jpg".into()
        )));
        assert!(pairs.contains(&("w".into(), "420".into())));
        assert!(pairs.contains(&("h".into(), "420".into())));
        assert!(pairs.contains(&("con".into(), "15".into())));
    }

    #[test]
    fn test_proxy_url_requires_art() {
        assert!(matches!(proxy_url(&ArtConfig::default(), ""), Err(ArtError::NoUrl)));
    }
}
