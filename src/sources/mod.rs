//! Content source adapters.
//!
//! Each adapter knows how to ask one upstream for its latest item and how to
//! normalize the answer into a [`ContentItem`]:
//!
//! - [`youtube`] - latest upload via the YouTube Data API search endpoint
//! - [`podcast`] - latest episode from a podcast RSS feed, or a placeholder
//! - [`devto`] - latest article via the Dev.to REST API
//! - [`medium`] - latest story from a Medium RSS feed
//!
//! Adapters never fail the run. [`Source::attempt`] turns every error into
//! `None` after logging it, so one broken upstream cannot block the others.

use async_trait::async_trait;
use thiserror::Error;

use crate::feed::{FetchError, ParseError};
use crate::storage::ContentItem;
use crate::util::{strip_control_chars, validate_link};

pub mod devto;
pub mod medium;
pub mod podcast;
pub mod youtube;

pub use devto::DevtoSource;
pub use medium::MediumSource;
pub use podcast::PodcastSource;
pub use youtube::YoutubeSource;

/// Why an adapter produced no item.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Transport failure (DNS, connection, TLS, timeout, oversize body)
    #[error(transparent)]
    Fetch(#[from] FetchError),
    /// The body was not the JSON shape we expected
    #[error("Unexpected JSON response: {0}")]
    Json(#[from] serde_json::Error),
    /// The body was not a parseable feed
    #[error(transparent)]
    Feed(#[from] ParseError),
    /// The upstream API answered with an explicit error object
    #[error("API error: {0}")]
    Api(String),
    /// Required fields were missing or unusable
    #[error("Malformed item: {0}")]
    Malformed(String),
    /// The request URL could not be built from configuration
    #[error("Invalid request URL: {0}")]
    Url(#[from] url::ParseError),
}

/// A place the latest content item can be obtained from.
#[async_trait]
pub trait Source: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Asks the upstream for its latest item.
    ///
    /// `Ok(None)` means the upstream answered but had nothing to offer.
    async fn fetch_latest(&self) -> Result<Option<ContentItem>, SourceError>;

    /// Like [`Source::fetch_latest`], but never fails.
    async fn attempt(&self) -> Option<ContentItem> {
        tracing::info!(source = self.name(), "Fetching latest item");
        match self.fetch_latest().await {
            Ok(Some(item)) => {
                tracing::info!(source = self.name(), title = %item.title, date = %item.date, "Fetched latest item");
                Some(item)
            }
            Ok(None) => {
                tracing::info!(source = self.name(), "Source returned no items");
                None
            }
            Err(e) => {
                tracing::warn!(source = self.name(), error = %e, "Failed to fetch latest item");
                None
            }
        }
    }
}

/// Final pass over an item built from upstream data.
///
/// Control characters are stripped from text fields. The item URL must be an
/// absolute http(s) link; an unusable image URL is dropped to `""` instead.
/// Links are kept as written, not normalized.
pub(crate) fn sanitize(item: ContentItem) -> Result<ContentItem, SourceError> {
    validate_link(&item.url)
        .map_err(|e| SourceError::Malformed(format!("item url {:?}: {e}", item.url)))?;

    let image = if item.image.is_empty() {
        String::new()
    } else {
        match validate_link(&item.image) {
            Ok(_) => item.image.trim().to_string(),
            Err(e) => {
                tracing::debug!(image = %item.image, error = %e, "Dropping unusable image URL");
                String::new()
            }
        }
    };

    Ok(ContentItem {
        title: strip_control_chars(&item.title).into_owned(),
        description: strip_control_chars(&item.description).into_owned(),
        url: item.url.trim().to_string(),
        date: item.date,
        image,
    })
}

/// The date part of an ISO-8601 timestamp (`2024-01-20T15:04:05Z` → `2024-01-20`).
pub(crate) fn date_part(timestamp: &str) -> &str {
    timestamp.split('T').next().unwrap_or(timestamp)
}
