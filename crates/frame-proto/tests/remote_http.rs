use std::time::Duration;

use frame_proto::config::LastFmConfig;
use frame_proto::lastfm::LastFmTracks;
use frame_proto::platform;
use frame_proto::remote::{FetchError, RemoteClient};
use frame_proto::track::{ParseError, RefreshError, TrackSource};
use reqwest::{StatusCode, Url};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Answer a single request with a canned response. The handle yields the
/// request head as received.
async fn serve_once(status: &str, body: &'static [u8]) -> (Url, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let status = status.to_string();

    let handle = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut head = Vec::new();
        let mut buf = [0u8; 1024];
        while !head.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = stream.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            head.extend_from_slice(&buf[..n]);
        }
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            body.len()
        );
        stream.write_all(response.as_bytes()).await.unwrap();
        stream.write_all(body).await.unwrap();
        stream.shutdown().await.unwrap();
        String::from_utf8_lossy(&head).into_owned()
    });

    let url = Url::parse(&format!("http://{addr}/2.0/")).unwrap();
    (url, handle)
}

fn client() -> RemoteClient {
    RemoteClient::new(Duration::from_secs(5)).unwrap()
}

fn lastfm(url: &Url) -> LastFmTracks {
    let config = LastFmConfig {
        api_key: "key".into(),
        username: "someone".into(),
        api_base: url.to_string(),
        recent_limit: 4,
    };
    LastFmTracks::new(client(), &config).unwrap()
}

#[tokio::test]
async fn requests_carry_user_agent() {
    let (url, server) = serve_once("200 OK", b"ok").await;

    assert_eq!(client().get_text(url).await.unwrap(), "ok");
    let head = server.await.unwrap().to_ascii_lowercase();
    let expected = format!("user-agent: {}", platform::user_agent()).to_ascii_lowercase();
    assert!(head.contains(&expected), "request head was:\n{head}");
}

#[tokio::test]
async fn error_status_keeps_text_body() {
    let body = br#"{"error":10,"message":"Invalid API key"}"#;
    let (url, server) = serve_once("403 Forbidden", body).await;

    let text = client().get_text(url).await.unwrap();
    assert_eq!(text.as_bytes(), body);
    server.await.unwrap();
}

#[tokio::test]
async fn bytes_require_ok_status() {
    let (url, server) = serve_once("404 Not Found", b"missing").await;
    match client().get_bytes(url).await {
        Err(FetchError::Status(status)) => assert_eq!(status, StatusCode::NOT_FOUND),
        other => panic!("expected a status error, got {other:?}"),
    }
    server.await.unwrap();

    let (url, server) = serve_once("200 OK", b"\x89PNG").await;
    assert_eq!(client().get_bytes(url).await.unwrap(), b"\x89PNG");
    server.await.unwrap();
}

#[tokio::test]
async fn fetch_recent_parses_body() {
    let body = br##"{"recenttracks":{"track":{"name":"Song A","artist":{"#text":"Artist X"},"@attr":{"nowplaying":"true"}}}}"##;
    let (url, server) = serve_once("200 OK", body).await;

    let tracks = lastfm(&url).fetch_recent(4).await.unwrap();
    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].name, "Song A");
    assert!(tracks[0].now_playing);

    let head = server.await.unwrap();
    assert!(head.contains("method=user.getrecenttracks"));
    assert!(head.contains("user=someone"));
    assert!(head.contains("limit=4"));
}

#[tokio::test]
async fn fetch_recent_failures() {
    let (url, server) = serve_once("200 OK", b"<html>gateway</html>").await;
    assert!(matches!(
        lastfm(&url).fetch_recent(4).await,
        Err(RefreshError::Parse(ParseError::NotJson(_)))
    ));
    server.await.unwrap();

    let (url, server) = serve_once("200 OK", br#"{"recenttracks":{"track":[]}}"#).await;
    assert!(matches!(
        lastfm(&url).fetch_recent(4).await,
        Err(RefreshError::Empty)
    ));
    server.await.unwrap();

    let (url, server) =
        serve_once("403 Forbidden", br#"{"error":10,"message":"Invalid API key"}"#).await;
    match lastfm(&url).fetch_recent(4).await {
        Err(RefreshError::Parse(ParseError::Api { code, message })) => {
            assert_eq!(code, 10);
            assert_eq!(message, "Invalid API key");
        }
        other => panic!("expected an API error, got {other:?}"),
    }
    server.await.unwrap();
}
