use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use std::time::Duration;

use super::{sanitize, Source, SourceError};
use crate::config::{Config, PodcastConfig};
use crate::feed::{fetch_text, parse_latest_entry, ParsedEntry};
use crate::storage::ContentItem;
use crate::util::{strip_html_tags, truncate_chars, MAX_DESCRIPTION_CHARS};

/// Title of the item written when no podcast feed is configured.
pub const PLACEHOLDER_TITLE: &str = "Episodio más reciente (actualizar manualmente)";
const PLACEHOLDER_DESCRIPTION: &str = "Descripción del episodio";

/// Latest podcast episode.
///
/// The show is hosted on Spotify, whose API needs an OAuth flow. Without a
/// public RSS feed configured the adapter returns a placeholder pointing at
/// the show page.
pub struct PodcastSource {
    client: reqwest::Client,
    config: PodcastConfig,
    timeout: Duration,
}

impl PodcastSource {
    pub fn new(client: reqwest::Client, config: &Config) -> Self {
        Self {
            client,
            config: config.podcast.clone(),
            timeout: config.request_timeout(),
        }
    }
}

pub fn placeholder(config: &PodcastConfig, today: NaiveDate) -> ContentItem {
    ContentItem {
        title: PLACEHOLDER_TITLE.to_string(),
        description: PLACEHOLDER_DESCRIPTION.to_string(),
        url: config.show_page(),
        date: today.format("%Y-%m-%d").to_string(),
        image: String::new(),
    }
}

#[async_trait]
impl Source for PodcastSource {
    fn name(&self) -> &'static str {
        "podcast"
    }

    async fn fetch_latest(&self) -> Result<Option<ContentItem>, SourceError> {
        let Some(feed_url) = self.config.feed_url.as_deref() else {
            tracing::debug!(show_id = %self.config.show_id, "No podcast feed configured, using placeholder");
            return Ok(Some(placeholder(&self.config, Utc::now().date_naive())));
        };

        let body = fetch_text(&self.client, feed_url, self.timeout).await?;
        match parse_latest_entry(body.as_bytes())? {
            Some(entry) => item_from_entry(entry, &self.config).map(Some),
            None => Ok(None),
        }
    }
}

fn item_from_entry(entry: ParsedEntry, config: &PodcastConfig) -> Result<ContentItem, SourceError> {
    let published = entry
        .published
        .ok_or_else(|| SourceError::Malformed(format!("episode {:?} has no date", entry.title)))?;

    let summary = entry.summary.unwrap_or_default();
    let description = strip_html_tags(&summary);
    let description = truncate_chars(description.trim(), MAX_DESCRIPTION_CHARS);
    let description = if description.is_empty() {
        entry.title.clone()
    } else {
        description.into_owned()
    };

    sanitize(ContentItem {
        title: entry.title,
        description,
        url: entry.url.unwrap_or_else(|| config.show_page()),
        date: published.format("%Y-%m-%d").to_string(),
        image: entry.image.unwrap_or_default(),
    })
}
