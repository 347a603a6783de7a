use async_trait::async_trait;
use lyricbar_core::{CoreError, FetchedLyrics, LyricsProvider, LyricsQuery, LyricsResult};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use serde::Deserialize;
use std::fmt::Write;
use std::time::Duration;
use tracing::{debug, info, warn};

const LRCLIB_API_URL: &str = "https://lrclib.net/api";

/// Default timeout for HTTP requests (10 seconds)
const DEFAULT_TIMEOUT_SECS: u64 = 10;
/// Default number of retry attempts
const DEFAULT_MAX_RETRIES: u32 = 2;

const USER_AGENT: &str = concat!(
    "lyricbar/",
    env!("CARGO_PKG_VERSION"),
    " (https://github.com/kvnxiao/lyricbar)"
);

/// LRCLIB.net lyrics provider
pub struct LrclibProvider {
    client: ClientWithMiddleware,
    base_url: String,
}

impl LrclibProvider {
    /// Create a new LRCLIB provider with default 10-second timeout and 2 retries.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new() -> Result<Self, CoreError> {
        Self::with_options(Duration::from_secs(DEFAULT_TIMEOUT_SECS), DEFAULT_MAX_RETRIES)
    }

    /// Create a provider with a custom request timeout and retry budget.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn with_options(timeout: Duration, max_retries: u32) -> Result<Self, CoreError> {
        let base_client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(5).min(timeout))
            .user_agent(USER_AGENT)
            .build()?;

        // Transient failures (timeouts, 5xx) are retried with exponential backoff
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(max_retries);
        let client = ClientBuilder::new(base_client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self {
            client,
            base_url: LRCLIB_API_URL.to_string(),
        })
    }

    /// Point the provider at another LRCLIB-compatible server
    #[must_use]
    pub fn with_endpoint(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

/// Response from LRCLIB API
/// Note: API returns additional fields (trackName, albumName) that we don't use;
/// serde ignores unknown fields by default.
#[derive(Debug, Deserialize)]
struct LrclibResponse {
    id: i64,
    #[serde(default)]
    instrumental: bool,
    #[serde(rename = "plainLyrics")]
    plain_lyrics: Option<String>,
    #[serde(rename = "syncedLyrics")]
    synced_lyrics: Option<String>,
}

#[async_trait]
impl LyricsProvider for LrclibProvider {
    fn name(&self) -> &'static str {
        "lrclib"
    }

    async fn fetch(&self, query: &LyricsQuery) -> Result<FetchedLyrics, CoreError> {
        let url = build_url(&self.base_url, query);
        info!(
            "Fetching lyrics from LRCLIB for: {} - {} (duration: {:?}s)",
            query.artist_name, query.track_name, query.duration_secs
        );
        debug!("LRCLIB GET: {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        debug!("LRCLIB response status: {}", status);

        if status == reqwest::StatusCode::NOT_FOUND {
            info!(
                "LRCLIB has no lyrics for {} - {}",
                query.artist_name, query.track_name
            );
            return Ok(FetchedLyrics {
                result: LyricsResult::NotFound,
                provider_id: String::new(),
            });
        }

        if !status.is_success() {
            warn!("LRCLIB returned status: {}", status);
            return Err(CoreError::LyricsProviderFailed {
                provider: self.name().to_string(),
                reason: format!("LRCLIB returned status: {status}"),
            });
        }

        let body: LrclibResponse =
            response
                .json()
                .await
                .map_err(|e| CoreError::LyricsProviderFailed {
                    provider: self.name().to_string(),
                    reason: format!("malformed response: {e}"),
                })?;
        Ok(parse_response(body))
    }
}

/// Build the exact-match lookup URL for `query`
fn build_url(base_url: &str, query: &LyricsQuery) -> String {
    let mut url = format!(
        "{}/get?track_name={}&artist_name={}",
        base_url,
        urlencoding::encode(&query.track_name),
        urlencoding::encode(&query.artist_name)
    );

    if let Some(album) = query.album_name.as_deref().filter(|a| !a.is_empty()) {
        let _ = write!(url, "&album_name={}", urlencoding::encode(album));
    }

    if let Some(duration) = query.duration_secs.filter(|d| *d > 0) {
        let _ = write!(url, "&duration={duration}");
    }

    url
}

fn parse_response(response: LrclibResponse) -> FetchedLyrics {
    let provider_id = response.id.to_string();

    // A match without lyric text is not an explicit "not found"
    if response.instrumental {
        debug!("Track is instrumental (lrclib id: {})", response.id);
        return FetchedLyrics {
            result: LyricsResult::Empty,
            provider_id,
        };
    }

    // Prefer synced lyrics
    if let Some(synced) = response.synced_lyrics.filter(|s| !s.trim().is_empty()) {
        debug!("Got synced lyrics (lrclib id: {})", response.id);
        return FetchedLyrics {
            result: LyricsResult::Synced(synced),
            provider_id,
        };
    }

    if let Some(plain) = response.plain_lyrics.filter(|p| !p.trim().is_empty()) {
        debug!("Got plain lyrics only (lrclib id: {})", response.id);
        return FetchedLyrics {
            result: LyricsResult::Unsynced(plain),
            provider_id,
        };
    }

    debug!("Match has blank lyrics (lrclib id: {})", response.id);
    FetchedLyrics {
        result: LyricsResult::Empty,
        provider_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lyricbar_core::{
        CacheLookup, LyricsCache, LyricsFetcher, LyricsLoad, PlaybackState, PlaybackStatus,
        TrackMetadata,
    };
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn parse(json: &str) -> FetchedLyrics {
        parse_response(serde_json::from_str(json).unwrap())
    }

    #[test]
    fn test_build_url_encodes_parameters() {
        let query = LyricsQuery::new("Don't Stop Me Now", "Queen & Friends");
        assert_eq!(
            build_url(LRCLIB_API_URL, &query),
            "https://lrclib.net/api/get?track_name=Don%27t%20Stop%20Me%20Now&artist_name=Queen%20%26%20Friends"
        );
    }

    #[test]
    fn test_build_url_optional_parameters() {
        let query = LyricsQuery::new("Song", "Artist")
            .with_album("Album")
            .with_duration(215);
        assert_eq!(
            build_url("http://localhost:8080/api", &query),
            "http://localhost:8080/api/get?track_name=Song&artist_name=Artist&album_name=Album&duration=215"
        );

        let query = LyricsQuery::new("Song", "Artist").with_album("").with_duration(0);
        assert!(!build_url(LRCLIB_API_URL, &query).contains("album_name"));
        assert!(!build_url(LRCLIB_API_URL, &query).contains("duration"));
    }

    #[test]
    fn test_synced_lyrics_preferred() {
        let fetched = parse(
            r#"{"id":42,"trackName":"Song","instrumental":false,
                "plainLyrics":"Hello","syncedLyrics":"[00:01.00]Hello"}"#,
        );
        assert_eq!(fetched.provider_id, "42");
        assert_eq!(
            fetched.result,
            LyricsResult::Synced("[00:01.00]Hello".to_string())
        );
    }

    #[test]
    fn test_plain_lyrics_only() {
        let fetched = parse(
            r#"{"id":7,"instrumental":false,"plainLyrics":"Hello","syncedLyrics":null}"#,
        );
        assert_eq!(fetched.result, LyricsResult::Unsynced("Hello".to_string()));
    }

    #[test]
    fn test_instrumental_is_empty_match() {
        let fetched = parse(
            r#"{"id":9,"instrumental":true,"plainLyrics":null,"syncedLyrics":null}"#,
        );
        assert_eq!(fetched.result, LyricsResult::Empty);
    }

    #[test]
    fn test_blank_lyrics_are_empty_match() {
        let fetched = parse(r#"{"id":3,"plainLyrics":"  ","syncedLyrics":""}"#);
        assert_eq!(fetched.result, LyricsResult::Empty);
        assert_eq!(fetched.provider_id, "3");
    }

    /// Serve a single HTTP response on a local port and return its base URL
    async fn serve_once(status: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut request = vec![0u8; 4096];
            let read = stream.read(&mut request).await.unwrap();
            assert!(read > 0);
            let response = format!(
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.unwrap();
        });
        format!("http://{addr}/api")
    }

    fn track() -> PlaybackState {
        let metadata = TrackMetadata {
            track_id: Some("/track/blank".to_string()),
            artists: vec!["A".to_string()],
            title: Some("T".to_string()),
            album: None,
            length: Some(Duration::from_secs(180)),
        };
        PlaybackState::from_metadata(metadata, PlaybackStatus::Playing, Duration::ZERO).unwrap()
    }

    #[tokio::test]
    async fn test_blank_match_is_not_negatively_cached() {
        let endpoint = serve_once(
            "200 OK",
            r#"{"id":5,"instrumental":false,"plainLyrics":"","syncedLyrics":""}"#,
        )
        .await;
        let provider = LrclibProvider::with_options(Duration::from_secs(5), 0)
            .unwrap()
            .with_endpoint(endpoint);
        let dir = tempfile::tempdir().unwrap();
        let cache = LyricsCache::open(dir.path());
        let fetcher = LyricsFetcher::new(Some(cache), vec![Box::new(provider)]);

        assert_eq!(fetcher.load(&track()).await, LyricsLoad::Missing);
        assert_eq!(
            LyricsCache::open(dir.path()).get(&track().identity).await,
            CacheLookup::Miss
        );
    }

    #[tokio::test]
    async fn test_http_404_is_negatively_cached() {
        let endpoint = serve_once("404 Not Found", r#"{"code":404,"name":"TrackNotFound"}"#).await;
        let provider = LrclibProvider::with_options(Duration::from_secs(5), 0)
            .unwrap()
            .with_endpoint(endpoint);
        let dir = tempfile::tempdir().unwrap();
        let cache = LyricsCache::open(dir.path());
        let fetcher = LyricsFetcher::new(Some(cache), vec![Box::new(provider)]);

        assert_eq!(fetcher.load(&track()).await, LyricsLoad::Missing);
        assert_eq!(
            LyricsCache::open(dir.path()).get(&track().identity).await,
            CacheLookup::NotFoundCached
        );
    }

    #[test]
    fn test_with_endpoint_trims_trailing_slash() {
        let provider = LrclibProvider::new()
            .unwrap()
            .with_endpoint("http://localhost:3000/api/");
        assert_eq!(provider.base_url, "http://localhost:3000/api");
        assert_eq!(provider.name(), "lrclib");
    }
}
