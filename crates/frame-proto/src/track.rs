//! Normalized track records and the last.fm `user.getrecenttracks` parser.
//!
//! The payload is loosely typed upstream: `track` is a list, or a bare object
//! when only one track exists; `artist` is either a string or an object with
//! a `#text` field; image variants are ordered small → large and any of them
//! may carry an empty URL. Everything is read through `serde_json::Value` so a
//! single odd entry is dropped instead of failing the batch.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::remote::FetchError;

/// Stand-in for a missing or blank name / artist.
pub const UNKNOWN: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub name: String,
    pub artist: String,
    /// URL of the largest available image, or empty when there is none.
    pub art_url: String,
    pub now_playing: bool,
}

impl Track {
    pub fn new(name: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            artist: artist.into(),
            art_url: String::new(),
            now_playing: false,
        }
    }

    pub fn with_art(mut self, art_url: impl Into<String>) -> Self {
        self.art_url = art_url.into();
        self
    }

    pub fn playing(mut self) -> Self {
        self.now_playing = true;
        self
    }

    pub fn has_art(&self) -> bool {
        !self.art_url.is_empty()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("response is not JSON: {0}")]
    NotJson(#[from] serde_json::Error),
    #[error("last.fm error {code}: {message}")]
    Api { code: i64, message: String },
    #[error("response has no recenttracks object")]
    MissingRecentTracks,
}

/// Why a refresh produced no tracks. The scheduler treats every variant the
/// same; the distinction is kept for logs.
#[derive(Debug, thiserror::Error)]
pub enum RefreshError {
    #[error("network: {0}")]
    Network(#[from] FetchError),
    #[error("parse: {0}")]
    Parse(#[from] ParseError),
    #[error("no tracks returned")]
    Empty,
}

/// A provider of recent tracks.
#[allow(async_fn_in_trait)]
pub trait TrackSource {
    /// Fetch up to `limit` recent tracks, most recent first.
    async fn fetch_recent(&mut self, limit: usize) -> Result<Vec<Track>, RefreshError>;

    /// Like [`fetch_recent`](Self::fetch_recent) but every failure collapses
    /// into an empty list.
    async fn refresh(&mut self, limit: usize) -> Vec<Track> {
        match self.fetch_recent(limit).await {
            Ok(tracks) => tracks,
            Err(e) => {
                warn!("[tracks] refresh failed: {}", e);
                Vec::new()
            }
        }
    }
}

/// Build the `user.getrecenttracks` request URL on top of `api_base`.
pub fn recent_tracks_url(
    api_base: &reqwest::Url,
    api_key: &str,
    username: &str,
    limit: usize,
) -> reqwest::Url {
    let mut url = api_base.clone();
    url.query_pairs_mut()
        .append_pair("method", "user.getrecenttracks")
        .append_pair("user", username)
        .append_pair("api_key", api_key)
        .append_pair("format", "json")
        .append_pair("limit", &limit.to_string());
    url
}

/// Parse a `user.getrecenttracks` JSON body into tracks, in source order.
pub fn parse_recent_tracks(body: &str) -> Result<Vec<Track>, ParseError> {
    let json: Value = serde_json::from_str(body.trim())?;

    if let Some(code) = json.get("error").and_then(Value::as_i64) {
        let message = json["message"].as_str().unwrap_or("").to_string();
        return Err(ParseError::Api { code, message });
    }

    let recent = json
        .get("recenttracks")
        .filter(|v| v.is_object())
        .ok_or(ParseError::MissingRecentTracks)?;

    let track_value = &recent["track"];
    let entries: Vec<&Value> = match track_value {
        Value::Array(items) => items.iter().collect(),
        Value::Object(_) => vec![track_value],
        _ => Vec::new(),
    };

    let tracks: Vec<Track> = entries.into_iter().filter_map(parse_entry).collect();
    debug!("[tracks] parsed {} tracks", tracks.len());
    Ok(tracks)
}

fn parse_entry(entry: &Value) -> Option<Track> {
    let Some(obj) = entry.as_object() else {
        warn!("[tracks] skipping malformed entry: {}", entry);
        return None;
    };

    let name = non_empty(obj.get("name").and_then(Value::as_str));

    let artist = match obj.get("artist") {
        Some(Value::String(s)) => non_empty(Some(s.as_str())),
        Some(a) if a.is_object() => non_empty(a["#text"].as_str()),
        _ => UNKNOWN.to_string(),
    };

    let art_url = obj
        .get("image")
        .and_then(Value::as_array)
        .and_then(|images| {
            images
                .iter()
                .rev()
                .filter_map(|img| img["#text"].as_str())
                .find(|url| !url.is_empty())
        })
        .unwrap_or("")
        .to_string();

    let now_playing = obj
        .get("@attr")
        .and_then(Value::as_object)
        .map(|attr| attr.contains_key("nowplaying"))
        .unwrap_or(false);

    Some(Track {
        name,
        artist,
        art_url,
        now_playing,
    })
}

/// Blank means whitespace-only; anything else is kept exactly as sent.
fn non_empty(s: Option<&str>) -> String {
    match s {
        Some(t) if !t.trim().is_empty() => t.to_string(),
        _ => UNKNOWN.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_playing_example() {
        let body = r##"{"recenttracks":{"track":[{"name":"Song A","artist":{"#text":"Artist X"},"image":[{"#text":""},{"#text":"http://img/a.jpg"}],"@attr":{"nowplaying":"true"}}]}}"##;
        let tracks = parse_recent_tracks(body).unwrap();
        assert_eq!(
            tracks,
            vec![Track {
                name: "Song A".into(),
                artist: "Artist X".into(),
                art_url: "http://img/a.jpg".into(),
                now_playing: true,
            }]
        );
    }

    #[test]
    fn test_order_fallbacks_and_largest_image() {
        let body = r##"{"recenttracks":{"track":[
            {"name":"One","artist":"Plain Artist","image":[{"#text":"s.jpg","size":"small"},{"#text":"xl.jpg","size":"extralarge"}]},
            {"artist":{"#text":""},"image":[]},
            {"name":"Three","artist":{"mbid":"x"},"image":[{"#text":"m.jpg"},{"#text":""}]}
        ]}}"##;
        let tracks = parse_recent_tracks(body).unwrap();
        assert_eq!(tracks.len(), 3);

        assert_eq!(tracks[0].name, "One");
        assert_eq!(tracks[0].artist, "Plain Artist");
        assert_eq!(tracks[0].art_url, "xl.jpg");
        assert!(!tracks[0].now_playing);

        assert_eq!(tracks[1].name, UNKNOWN);
        assert_eq!(tracks[1].artist, UNKNOWN);
        assert_eq!(tracks[1].art_url, "");

        assert_eq!(tracks[2].name, "Three");
        assert_eq!(tracks[2].artist, UNKNOWN);
        assert_eq!(tracks[2].art_url, "m.jpg");
    }

    #[test]
    fn test_names_kept_verbatim() {
        let body = r##"{"recenttracks":{"track":[
            {"name":" Song ","artist":{"#text":"  Padded"}},
            {"name":"   ","artist":"\t"}
        ]}}"##;
        let tracks = parse_recent_tracks(body).unwrap();
        assert_eq!(tracks[0].name, " Song ");
        assert_eq!(tracks[0].artist, "  Padded");
        assert_eq!(tracks[1].name, UNKNOWN);
        assert_eq!(tracks[1].artist, UNKNOWN);
    }

    #[test]
    fn test_empty_track_list() {
        let tracks = parse_recent_tracks(r#"{"recenttracks":{"track":[]}}"#).unwrap();
        assert!(tracks.is_empty());
    }

    #[test]
    fn test_single_track_object() {
        let body = r##"{"recenttracks":{"track":{"name":"Solo","artist":{"#text":"Only"}}}}"##;
        let tracks = parse_recent_tracks(body).unwrap();
        assert_eq!(tracks, vec![Track::new("Solo", "Only")]);
    }

    #[test]
    fn test_malformed_entry_is_dropped() {
        let body = r##"{"recenttracks":{"track":[42,{"name":"Kept","artist":"A"},"junk"]}}"##;
        let tracks = parse_recent_tracks(body).unwrap();
        assert_eq!(tracks, vec![Track::new("Kept", "A")]);
    }

    #[test]
    fn test_not_json() {
        let err = parse_recent_tracks("<html>502 Bad Gateway</html>").unwrap_err();
        assert!(matches!(err, ParseError::NotJson(_)));
    }

    #[test]
    fn test_api_error_document() {
        let err = parse_recent_tracks(r#"{"error":6,"message":"User not found"}"#).unwrap_err();
        match err {
            ParseError::Api { code, message } => {
                assert_eq!(code, 6);
                assert_eq!(message, "User not found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_missing_recenttracks() {
        assert!(matches!(
            parse_recent_tracks("{}").unwrap_err(),
            ParseError::MissingRecentTracks
        ));
    }

    #[test]
    fn test_recent_tracks_url() {
        let base = reqwest::Url::parse("https://ws.audioscrobbler.com/2.0/").unwrap();
        let url = recent_tracks_url(&base, "KEY", "some user", 4);
        assert_eq!(url.host_str(), Some("ws.audioscrobbler.com"));
        let query = url.query().unwrap();
        assert!(query.contains("method=user.getrecenttracks"));
        assert!(query.contains("user=some+user"));
        assert!(query.contains("api_key=KEY"));
        assert!(query.contains("format=json"));
        assert!(query.contains("limit=4"));
    }

    struct Failing;

    impl TrackSource for Failing {
        async fn fetch_recent(&mut self, _limit: usize) -> Result<Vec<Track>, RefreshError> {
            Err(RefreshError::Parse(ParseError::MissingRecentTracks))
        }
    }

    #[tokio::test]
    async fn test_refresh_collapses_failure_to_empty() {
        assert!(Failing.refresh(4).await.is_empty());
    }
}
