use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

use super::{date_part, sanitize, Source, SourceError};
use crate::config::{Config, DevtoConfig};
use crate::feed::fetch_text;
use crate::storage::ContentItem;

/// Most recent article of a user, via `GET /articles?username=..&per_page=1`.
///
/// Fields come pre-sized from the API and are not truncated.
pub struct DevtoSource {
    client: reqwest::Client,
    config: DevtoConfig,
    timeout: Duration,
}

impl DevtoSource {
    pub fn new(client: reqwest::Client, config: &Config) -> Self {
        Self {
            client,
            config: config.devto.clone(),
            timeout: config.request_timeout(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Article {
    title: String,
    #[serde(default)]
    description: Option<String>,
    url: String,
    published_at: String,
    #[serde(default)]
    cover_image: Option<String>,
    #[serde(default)]
    social_image: Option<String>,
}

impl Article {
    fn into_item(self) -> Result<ContentItem, SourceError> {
        let description = self
            .description
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| self.title.clone());
        let image = self
            .cover_image
            .filter(|i| !i.is_empty())
            .or(self.social_image)
            .unwrap_or_default();

        sanitize(ContentItem {
            date: date_part(&self.published_at).to_string(),
            title: self.title,
            description,
            url: self.url,
            image,
        })
    }
}

#[async_trait]
impl Source for DevtoSource {
    fn name(&self) -> &'static str {
        "devto"
    }

    async fn fetch_latest(&self) -> Result<Option<ContentItem>, SourceError> {
        let url = Url::parse_with_params(
            &format!("{}/articles", self.config.api_base.trim_end_matches('/')),
            &[
                ("username", self.config.username.as_str()),
                ("per_page", "1"),
            ],
        )?;

        let body = fetch_text(&self.client, url.as_str(), self.timeout).await?;
        let articles: Vec<Article> = serde_json::from_str(&body)?;

        match articles.into_iter().next() {
            Some(article) => article.into_item().map(Some),
            None => Ok(None),
        }
    }
}
