//! Configuration file parser for `glean.toml`.
//!
//! The config file is optional: a missing file yields `Config::default()`.
//! Unknown keys are accepted by serde, though we log a warning when the file
//! contains potential typos. YouTube credentials may also come from the
//! `YOUTUBE_API_KEY` / `YOUTUBE_CHANNEL_ID` environment variables, which take
//! precedence over the file.
use secrecy::SecretString;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::util::{validate_endpoint, UrlValidationError};

/// Environment variable holding the YouTube Data API key.
pub const YOUTUBE_API_KEY_ENV: &str = "YOUTUBE_API_KEY";
/// Environment variable holding the YouTube channel id (`UC...`).
pub const YOUTUBE_CHANNEL_ID_ENV: &str = "YOUTUBE_CHANNEL_ID";

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),

    /// A configured API base URL is unusable.
    #[error("Invalid endpoint for {field}: {source}")]
    Endpoint {
        field: &'static str,
        #[source]
        source: UrlValidationError,
    },
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path of the persisted content document.
    pub output: PathBuf,

    /// User-Agent sent with every request. Some endpoints reject bare clients.
    pub user_agent: String,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,

    pub youtube: YoutubeConfig,
    pub devto: DevtoConfig,
    pub medium: MediumConfig,
    pub podcast: PodcastConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output: PathBuf::from("src/data/content.json"),
            user_agent: "Mozilla/5.0".to_string(),
            request_timeout_secs: 30,
            youtube: YoutubeConfig::default(),
            devto: DevtoConfig::default(),
            medium: MediumConfig::default(),
            podcast: PodcastConfig::default(),
        }
    }
}

/// Video source settings.
///
/// Custom Debug impl masks `api_key` to prevent secret leakage in logs.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct YoutubeConfig {
    /// Public channel handle without the `@`, used for the channel page link
    /// and for channel id lookups.
    pub handle: String,

    pub api_base: String,

    /// Data API key (alternative to `YOUTUBE_API_KEY`).
    pub api_key: Option<String>,

    /// Channel id (alternative to `YOUTUBE_CHANNEL_ID`).
    pub channel_id: Option<String>,
}

impl Default for YoutubeConfig {
    fn default() -> Self {
        Self {
            handle: "devpicon".to_string(),
            api_base: "https://www.googleapis.com/youtube/v3".to_string(),
            api_key: None,
            channel_id: None,
        }
    }
}

impl std::fmt::Debug for YoutubeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YoutubeConfig")
            .field("handle", &self.handle)
            .field("api_base", &self.api_base)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("channel_id", &self.channel_id)
            .finish()
    }
}

impl YoutubeConfig {
    /// Public page of the channel, e.g. `https://youtube.com/@devpicon`.
    pub fn channel_page(&self) -> String {
        format!("https://youtube.com/@{}", self.handle)
    }

    /// Resolves the API credentials, or `None` when either one is missing.
    ///
    /// Blank values count as missing.
    pub fn credentials(&self) -> Option<YoutubeCredentials> {
        let api_key = non_blank(self.api_key.as_deref())?;
        let channel_id = non_blank(self.channel_id.as_deref())?;
        Some(YoutubeCredentials {
            api_key: SecretString::from(api_key.to_string()),
            channel_id: channel_id.to_string(),
        })
    }
}

/// Credentials required by the video adapter.
#[derive(Debug)]
pub struct YoutubeCredentials {
    pub api_key: SecretString,
    pub channel_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DevtoConfig {
    pub username: String,
    pub api_base: String,
}

impl Default for DevtoConfig {
    fn default() -> Self {
        Self {
            username: "devpicon".to_string(),
            api_base: "https://dev.to/api".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MediumConfig {
    pub feed_url: String,
}

impl Default for MediumConfig {
    fn default() -> Self {
        Self {
            feed_url: "https://medium.com/feed/@devpicon".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PodcastConfig {
    /// Spotify show id, used for the placeholder link.
    pub show_id: String,

    /// Optional public RSS feed of the show. When unset the adapter returns a
    /// placeholder pointing at the show page.
    pub feed_url: Option<String>,
}

impl Default for PodcastConfig {
    fn default() -> Self {
        Self {
            show_id: "1iyrRtXu0hrOQJyA7vdGiX".to_string(),
            feed_url: None,
        }
    }
}

impl PodcastConfig {
    pub fn show_page(&self) -> String {
        format!("https://open.spotify.com/show/{}", self.show_id)
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 7] = [
        "output",
        "user_agent",
        "request_timeout_secs",
        "youtube",
        "devto",
        "medium",
        "podcast",
    ];

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown top-level keys → accepted, logged as warning
    /// - Non-HTTPS API base (other than loopback) → `Err(ConfigError::Endpoint)`
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
                // Race condition: file deleted between metadata and read
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
        config.validate()?;
        tracing::info!(path = %path.display(), output = %config.output.display(), "Loaded configuration");
        Ok(config)
    }

    /// Overlays values from the environment. Non-empty variables win over the file.
    ///
    /// Takes a lookup function so tests do not have to mutate the process environment.
    pub fn apply_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(YOUTUBE_API_KEY_ENV).filter(|v| !v.trim().is_empty()) {
            self.youtube.api_key = Some(key);
        }
        if let Some(id) = lookup(YOUTUBE_CHANNEL_ID_ENV).filter(|v| !v.trim().is_empty()) {
            self.youtube.channel_id = Some(id);
        }
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Builds the HTTP client shared by every adapter.
    pub fn http_client(&self) -> reqwest::Result<reqwest::Client> {
        reqwest::Client::builder()
            .user_agent(self.user_agent.as_str())
            .build()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let endpoints = [
            ("youtube.api_base", Some(self.youtube.api_base.as_str())),
            ("devto.api_base", Some(self.devto.api_base.as_str())),
            ("medium.feed_url", Some(self.medium.feed_url.as_str())),
            ("podcast.feed_url", self.podcast.feed_url.as_deref()),
        ];
        for (field, value) in endpoints {
            if let Some(value) = value {
                validate_endpoint(value)
                    .map_err(|source| ConfigError::Endpoint { field, source })?;
            }
        }
        Ok(())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

// ============================================================================
// Tests
// ============================================================================
