use chrono::{DateTime, Utc};
use feed_rs::parser;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("Feed parse error: {0}")]
pub struct ParseError(#[from] feed_rs::parser::ParseFeedError);

/// The fields of a feed entry the site cares about.
#[derive(Debug, Clone)]
pub struct ParsedEntry {
    pub title: String,
    pub url: Option<String>,
    pub published: Option<DateTime<Utc>>,
    /// Summary, falling back to the full content body. May contain HTML.
    pub summary: Option<String>,
    /// Entry thumbnail (e.g. `itunes:image`), falling back to the feed logo.
    pub image: Option<String>,
}

/// Parses an RSS/Atom/JSON feed and returns its most recent entry.
///
/// Entries are ranked by `published`, then `updated`; entries without either
/// rank below dated ones, and ties keep document order. An empty feed yields
/// `Ok(None)`.
pub fn parse_latest_entry(bytes: &[u8]) -> Result<Option<ParsedEntry>, ParseError> {
    let feed = parser::parse(bytes)?;
    let feed_image = feed.logo.map(|l| l.uri).or(feed.icon.map(|i| i.uri));

    let mut latest: Option<(Option<DateTime<Utc>>, feed_rs::model::Entry)> = None;
    for entry in feed.entries {
        let when = entry.published.or(entry.updated);
        let newer = match &latest {
            None => true,
            Some((best, _)) => when > *best,
        };
        if newer {
            latest = Some((when, entry));
        }
    }

    Ok(latest.map(|(published, entry)| {
        let url = entry.links.first().map(|l| l.href.clone());
        let summary = entry
            .summary
            .map(|s| s.content)
            .or_else(|| entry.content.and_then(|c| c.body));
        let title = entry
            .title
            .map(|t| t.content)
            .unwrap_or_else(|| "Untitled".to_string());
        let image = entry
            .media
            .iter()
            .flat_map(|m| m.thumbnails.iter())
            .map(|t| t.image.uri.clone())
            .next()
            .or(feed_image);

        ParsedEntry {
            title,
            url,
            published,
            summary,
            image,
        }
    }))
}
