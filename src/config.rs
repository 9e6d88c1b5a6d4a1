//! Configuration for the feed front.
//!
//! Settings come from an optional TOML file (`~/.config/blogview/config.toml`
//! by default) and are then overridden by environment variables, read once at
//! startup. A missing file yields `Config::default()`, which points at the
//! default public Blogger feed. Missing credentials are logged, never fatal.
use crate::feed::is_blogger_api;
use secrecy::SecretString;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Public feed used when neither a feed URL nor a blog id is configured.
pub const DEFAULT_FEED_URL: &str = "https://ur9group.blogspot.com/feeds/posts/default?alt=json";

pub const ENV_FEED_URL: &str = "BLOGGER_FEED_URL";
pub const ENV_API_KEY: &str = "BLOGGER_API_KEY";
pub const ENV_BLOG_ID: &str = "BLOGGER_BLOG_ID";

const DEFAULT_CACHE_TTL_SECS: u64 = 60;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file too large: {0}")]
    TooLarge(String),

    #[error("Invalid {field} '{value}': {source}")]
    InvalidUrl {
        field: &'static str,
        value: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Unsupported scheme in {field}: {scheme} (only http/https allowed)")]
    UnsupportedScheme { field: &'static str, scheme: String },

    #[error("Fallback posts file contains no posts: {0}")]
    EmptyFallback(String),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
/// `api_key` is masked in `Debug` output.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Feed endpoint. Takes precedence over `blog_id`.
    pub feed_url: Option<String>,

    /// Origin used to absolutize relative image URLs. Defaults to the
    /// origin of the feed URL.
    pub site_origin: Option<String>,

    /// Freshness window for cached feed responses, in seconds.
    pub cache_ttl_secs: u64,

    /// Upper bound on a single feed request, in seconds.
    pub request_timeout_secs: u64,

    /// TOML file of sample posts served when the feed is empty or down.
    pub fallback_posts: Option<PathBuf>,

    /// Blogger API key (alternative to the BLOGGER_API_KEY env var).
    pub api_key: Option<String>,

    /// Blogger blog id, used to build the feed URL when `feed_url` is unset.
    pub blog_id: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            feed_url: None,
            site_origin: None,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            fallback_posts: None,
            api_key: None,
            blog_id: None,
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("feed_url", &self.feed_url)
            .field("site_origin", &self.site_origin)
            .field("cache_ttl_secs", &self.cache_ttl_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("fallback_posts", &self.fallback_posts)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("blog_id", &self.blog_id)
            .finish()
    }
}

/// Resolved, validated settings for the feed client and adapter.
#[derive(Debug, Clone)]
pub struct FeedSettings {
    pub endpoint: Url,
    pub origin: Url,
    pub api_key: Option<SecretString>,
    pub cache_ttl: Duration,
    pub request_timeout: Duration,
}

impl FeedSettings {
    /// Settings for `endpoint` with default timings and the endpoint's own
    /// origin.
    pub fn for_endpoint(endpoint: Url) -> Self {
        let origin = origin_of(&endpoint);
        Self {
            endpoint,
            origin,
            api_key: None,
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl Config {
    pub(crate) const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 7] = [
        "feed_url",
        "site_origin",
        "cache_ttl_secs",
        "request_timeout_secs",
        "fallback_posts",
        "api_key",
        "blog_id",
    ];

    /// `~/.config/blogview/config.toml`, or `None` when HOME is unset.
    pub fn default_path() -> Option<PathBuf> {
        let home = std::env::var_os("HOME")?;
        Some(
            PathBuf::from(home)
                .join(".config")
                .join("blogview")
                .join("config.toml"),
        )
    }

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)`
    /// - Unknown keys → accepted, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(&content)?;
        tracing::info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Applies `BLOGGER_*` environment overrides. Env wins over the file.
    pub fn with_env(self) -> Self {
        self.with_env_from(|key| std::env::var(key).ok())
    }

    /// Same as [`Config::with_env`] with an injectable variable lookup.
    pub fn with_env_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = var(ENV_FEED_URL) {
            self.feed_url = Some(url);
        }
        if let Some(key) = var(ENV_API_KEY) {
            self.api_key = Some(key);
        }
        if let Some(id) = var(ENV_BLOG_ID) {
            self.blog_id = Some(id);
        }
        self
    }

    /// The endpoint the feed client should fetch.
    ///
    /// `feed_url` wins. Otherwise a blog id selects that blog's Blogger API
    /// v3 post list when an API key is configured, or its public JSON feed
    /// when not. With neither, the default public feed is used.
    pub fn feed_url(&self) -> String {
        match (&self.feed_url, &self.blog_id, &self.api_key) {
            (Some(url), _, _) => url.clone(),
            (None, Some(blog_id), Some(_)) => format!(
                "https://www.googleapis.com/blogger/v3/blogs/{}/posts",
                blog_id.trim()
            ),
            (None, Some(blog_id), None) => format!(
                "https://www.blogger.com/feeds/{}/posts/default?alt=json",
                blog_id.trim()
            ),
            (None, None, _) => DEFAULT_FEED_URL.to_string(),
        }
    }

    /// Validates URLs and resolves the settings used by the feed layer.
    pub fn feed_settings(&self) -> Result<FeedSettings, ConfigError> {
        if self.feed_url.is_none() && self.blog_id.is_none() {
            tracing::warn!(
                feed_url = DEFAULT_FEED_URL,
                "Blogger feed not configured (set {} or {}), using the default public feed",
                ENV_FEED_URL,
                ENV_BLOG_ID
            );
        }

        let endpoint = parse_http_url("feed_url", &self.feed_url())?;

        let origin = match &self.site_origin {
            Some(origin) => origin_of(&parse_http_url("site_origin", origin)?),
            None => origin_of(&endpoint),
        };

        match (is_blogger_api(&endpoint), self.api_key.is_some()) {
            (true, false) => tracing::warn!(
                "Blogger API credentials not found ({} unset), requests may be rejected",
                ENV_API_KEY
            ),
            (false, true) => tracing::warn!(
                feed_url = %endpoint,
                "API key configured for a public feed URL, the key will not be sent"
            ),
            (true, true) if self.site_origin.is_none() => tracing::warn!(
                "Blogger API endpoint without site_origin, relative image paths resolve against {}",
                origin
            ),
            _ => {}
        }

        Ok(FeedSettings {
            endpoint,
            origin,
            api_key: self.api_key.clone().map(SecretString::from),
            cache_ttl: Duration::from_secs(self.cache_ttl_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs.max(1)),
        })
    }
}

fn parse_http_url(field: &'static str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value.trim()).map_err(|source| ConfigError::InvalidUrl {
        field,
        value: value.to_string(),
        source,
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(ConfigError::UnsupportedScheme {
            field,
            scheme: scheme.to_owned(),
        }),
    }
}

/// Scheme, host and port of `url`, with an empty path.
fn origin_of(url: &Url) -> Url {
    let mut origin = url.clone();
    origin.set_path("");
    origin.set_query(None);
    origin.set_fragment(None);
    let _ = origin.set_username("");
    let _ = origin.set_password(None);
    origin
}

// ============================================================================
// Tests
// ============================================================================
