//! HTTPS client shared by the track service and the art fetcher.

use std::time::Duration;

use reqwest::{StatusCode, Url};
use tracing::{debug, warn};

use crate::platform;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("server returned status {0}")]
    Status(StatusCode),
}

/// Thin wrapper over `reqwest::Client` that always sends our User-Agent and
/// bounds every request with a timeout.
#[derive(Debug, Clone)]
pub struct RemoteClient {
    http: reqwest::Client,
}

impl RemoteClient {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(platform::user_agent())
            .timeout(timeout)
            .build()?;
        Ok(Self { http })
    }

    /// GET a text body. Non-2xx responses still return their body, since
    /// last.fm reports API errors as JSON documents with 4xx statuses.
    pub async fn get_text(&self, url: Url) -> Result<String, FetchError> {
        debug!("[remote] GET {}", redact(&url));
        let response = self.http.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            warn!("[remote] status {} ({} bytes)", status, body.len());
        }
        Ok(body)
    }

    /// GET raw bytes; anything but 200 is an error.
    pub async fn get_bytes(&self, url: Url) -> Result<Vec<u8>, FetchError> {
        debug!("[remote] GET {}", redact(&url));
        let response = self.http.get(url).send().await?;
        if response.status() != StatusCode::OK {
            return Err(FetchError::Status(response.status()));
        }
        Ok(response.bytes().await?.to_vec())
    }
}

/// Strip the API key from a URL before it reaches the log file.
fn redact(url: &Url) -> String {
    let mut shown = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if k == "api_key" { "***".to_string() } else { v.into_owned() };
            (k.into_owned(), v)
        })
        .collect();
    if !pairs.is_empty() {
        shown.query_pairs_mut().clear().extend_pairs(pairs);
    }
    shown.to_string()
}
