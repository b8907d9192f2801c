use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;

use super::{sanitize, Source, SourceError};
use crate::config::Config;
use crate::feed::{extract_tag, fetch_text, first_item};
use crate::storage::ContentItem;
use crate::util::{first_img_src, strip_html_tags, truncate_chars, MAX_DESCRIPTION_CHARS};

/// Most recent story of a Medium RSS feed.
pub struct MediumSource {
    client: reqwest::Client,
    feed_url: String,
    timeout: Duration,
}

impl MediumSource {
    pub fn new(client: reqwest::Client, config: &Config) -> Self {
        Self {
            client,
            feed_url: config.medium.feed_url.clone(),
            timeout: config.request_timeout(),
        }
    }
}

#[async_trait]
impl Source for MediumSource {
    fn name(&self) -> &'static str {
        "medium"
    }

    async fn fetch_latest(&self) -> Result<Option<ContentItem>, SourceError> {
        let body = fetch_text(&self.client, &self.feed_url, self.timeout).await?;
        first_item(&body).map(item_from_rss).transpose()
    }
}

/// Builds an item from the inner markup of an RSS `<item>`.
fn item_from_rss(item: &str) -> Result<ContentItem, SourceError> {
    let pub_date = extract_tag(item, "pubDate");
    let date = parse_pub_date(&pub_date)
        .ok_or_else(|| SourceError::Malformed(format!("unparseable pubDate {pub_date:?}")))?;

    let description = extract_tag(item, "description");
    let description = truncate_chars(&strip_html_tags(&description), MAX_DESCRIPTION_CHARS).into_owned();

    let content = extract_tag(item, "content:encoded");
    let image = first_img_src(&content).unwrap_or_default().to_string();

    sanitize(ContentItem {
        title: extract_tag(item, "title"),
        description,
        url: extract_tag(item, "link"),
        date: date.format("%Y-%m-%d").to_string(),
        image,
    })
}

/// RSS dates are RFC 2822; some feeds use RFC 3339 instead.
fn parse_pub_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc2822(raw)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
