use crate::config::FeedSettings;
use crate::feed::cache::FreshnessCache;
use crate::feed::parser::{parse_feed, ParseError, ParseResult};
use crate::feed::raw::RawEntry;
use futures::StreamExt;
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

const MAX_FEED_SIZE: usize = 10 * 1024 * 1024; // 10MB
const MAX_REDIRECTS: usize = 3;
const USER_AGENT: &str = concat!("blogview/", env!("CARGO_PKG_VERSION"));

/// Builds the shared HTTP client used for feed requests.
///
/// Follows at most 3 redirects and rejects redirect loops. Blogspot
/// custom domains redirect once; anything longer is a misconfigured feed URL.
pub fn build_http_client() -> Result<reqwest::Client, FetchError> {
    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .redirect(redirect_policy())
        .pool_max_idle_per_host(2)
        .tcp_keepalive(Duration::from_secs(60))
        .build()?;
    Ok(client)
}

fn redirect_policy() -> reqwest::redirect::Policy {
    reqwest::redirect::Policy::custom(|attempt| {
        if attempt.previous().len() >= MAX_REDIRECTS {
            return attempt.error("Too many redirects (max 3)");
        }

        let url = attempt.url();
        if attempt.previous().iter().any(|prev| prev == url) {
            return attempt.error("Redirect loop detected");
        }

        tracing::debug!(
            from = %attempt.previous().last().map(|u| u.as_str()).unwrap_or("initial"),
            to = %url,
            "Following feed redirect"
        );
        attempt.follow()
    })
}

/// Errors that can occur while fetching the feed.
///
/// These never reach repository callers: [`FeedClient::fetch_entries`]
/// logs them and returns an empty entry list.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Request exceeded the configured timeout
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
    /// Response body exceeded the 10MB size limit
    #[error("Response too large")]
    ResponseTooLarge,
    /// Body was not a readable feed
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
}

/// Source of raw feed entries.
///
/// Implementations must not fail: an unavailable source yields an empty
/// list. [`FeedClient`] is the production implementation.
pub trait EntrySource {
    fn fetch_entries(&self) -> impl std::future::Future<Output = Arc<Vec<RawEntry>>> + Send;
}

/// HTTP client for the blog feed, with a freshness cache in front of it.
pub struct FeedClient {
    http: reqwest::Client,
    endpoint: Url,
    api_key: Option<SecretString>,
    timeout: Duration,
    cache: FreshnessCache<Arc<Vec<RawEntry>>>,
}

impl FeedClient {
    pub fn new(http: reqwest::Client, settings: &FeedSettings) -> Self {
        Self {
            http,
            endpoint: settings.endpoint.clone(),
            api_key: settings.api_key.clone(),
            timeout: settings.request_timeout,
            cache: FreshnessCache::new(settings.cache_ttl),
        }
    }

    /// Performs one uncached fetch and parse of the feed.
    ///
    /// # Errors
    ///
    /// - [`FetchError::Network`] - Connection or TLS errors
    /// - [`FetchError::Timeout`] - Request exceeded the configured timeout
    /// - [`FetchError::HttpStatus`] - Non-2xx HTTP response
    /// - [`FetchError::ResponseTooLarge`] - Body exceeded 10MB
    /// - [`FetchError::Parse`] - Body was neither Blogger JSON nor Atom
    pub async fn fetch(&self) -> Result<Vec<RawEntry>, FetchError> {
        // One deadline covers connecting, headers and the body
        let bytes = tokio::time::timeout(self.timeout, self.download())
            .await
            .map_err(|_| FetchError::Timeout(self.timeout))??;

        let ParseResult { entries, skipped } = parse_feed(&bytes)?;

        if skipped > 0 {
            tracing::warn!(
                feed = %self.endpoint,
                skipped = skipped,
                "Malformed feed entries skipped"
            );
        }

        tracing::debug!(feed = %self.endpoint, entries = entries.len(), "Fetched feed");
        Ok(entries)
    }

    async fn download(&self) -> Result<Vec<u8>, FetchError> {
        let response = self.http.get(self.request_url()).send().await?;

        if !response.status().is_success() {
            return Err(FetchError::HttpStatus(response.status().as_u16()));
        }

        read_limited_bytes(response, MAX_FEED_SIZE).await
    }

    /// The endpoint, with the API key attached for Blogger API v3 requests
    /// only. Public feed URLs never see the key.
    fn request_url(&self) -> Url {
        let mut url = self.endpoint.clone();
        if let Some(key) = &self.api_key {
            if is_blogger_api(&url) {
                tracing::trace!("Blogger API authentication configured");
                url.query_pairs_mut().append_pair("key", key.expose_secret());
            }
        }
        url
    }
}

/// Blogger API v3 endpoints: the Google API host or a `/blogger/v3/` path.
pub(crate) fn is_blogger_api(url: &Url) -> bool {
    url.host_str() == Some("www.googleapis.com") || url.path().starts_with("/blogger/v3/")
}

impl EntrySource for FeedClient {
    /// Returns the feed's entries, serving a cached copy inside the
    /// freshness window. Failures are logged and yield an empty list; they
    /// are not cached.
    async fn fetch_entries(&self) -> Arc<Vec<RawEntry>> {
        if let Some(entries) = self.cache.get() {
            tracing::debug!(entries = entries.len(), "Serving feed from cache");
            return entries;
        }

        match self.fetch().await {
            Ok(entries) => {
                let entries = Arc::new(entries);
                self.cache.store(Arc::clone(&entries));
                entries
            }
            Err(e) => {
                tracing::warn!(
                    feed = %self.endpoint,
                    error = %e,
                    "Failed to fetch blog feed, continuing without entries"
                );
                Arc::default()
            }
        }
    }
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(FetchError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}
