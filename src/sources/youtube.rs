use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use secrecy::ExposeSecret;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

use super::{date_part, sanitize, Source, SourceError};
use crate::config::{Config, YoutubeConfig};
use crate::feed::fetch_text;
use crate::storage::ContentItem;
use crate::util::{truncate_chars, MAX_DESCRIPTION_CHARS};

/// Title of the item written when the API credentials are not configured.
pub const UNCONFIGURED_TITLE: &str = "Configura YouTube API para auto-actualizar";
const UNCONFIGURED_DESCRIPTION: &str = "Ve a API_SETUP.md para instrucciones";

/// Latest upload of a channel, via the Data API `search` endpoint.
pub struct YoutubeSource {
    client: reqwest::Client,
    config: YoutubeConfig,
    timeout: Duration,
}

impl YoutubeSource {
    pub fn new(client: reqwest::Client, config: &Config) -> Self {
        Self {
            client,
            config: config.youtube.clone(),
            timeout: config.request_timeout(),
        }
    }
}

/// Item written in degraded mode: tells the operator what to configure and
/// links to the public channel page.
pub fn unconfigured_placeholder(config: &YoutubeConfig, today: NaiveDate) -> ContentItem {
    ContentItem {
        title: UNCONFIGURED_TITLE.to_string(),
        description: UNCONFIGURED_DESCRIPTION.to_string(),
        url: config.channel_page(),
        date: today.format("%Y-%m-%d").to_string(),
        image: String::new(),
    }
}

#[async_trait]
impl Source for YoutubeSource {
    fn name(&self) -> &'static str {
        "youtube"
    }

    async fn fetch_latest(&self) -> Result<Option<ContentItem>, SourceError> {
        let Some(credentials) = self.config.credentials() else {
            tracing::warn!(
                "YOUTUBE_API_KEY or YOUTUBE_CHANNEL_ID not configured; set them in .env.local, the environment or glean.toml"
            );
            return Ok(Some(unconfigured_placeholder(
                &self.config,
                Utc::now().date_naive(),
            )));
        };

        let url = Url::parse_with_params(
            &endpoint(&self.config.api_base, "search"),
            &[
                ("key", credentials.api_key.expose_secret()),
                ("channelId", credentials.channel_id.as_str()),
                ("part", "snippet"),
                ("order", "date"),
                ("maxResults", "1"),
                ("type", "video"),
            ],
        )?;

        let body = fetch_text(&self.client, url.as_str(), self.timeout).await?;
        let response: SearchResponse = serde_json::from_str(&body)?;

        if let Some(error) = response.error {
            return Err(SourceError::Api(error.to_string()));
        }

        match response.items.into_iter().next() {
            Some(video) => video.into_item().map(Some),
            None => Ok(None),
        }
    }
}

/// A channel found by [`lookup_channel_id`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelInfo {
    pub id: String,
    pub title: String,
}

/// Resolves the channel id (`UC...`) of a legacy YouTube username.
///
/// `Ok(None)` means the API answered but knows no channel by that name, which
/// is common for channels created after handles replaced usernames.
pub async fn lookup_channel_id(
    client: &reqwest::Client,
    config: &Config,
    api_key: &str,
    username: &str,
) -> Result<Option<ChannelInfo>, SourceError> {
    let url = Url::parse_with_params(
        &endpoint(&config.youtube.api_base, "channels"),
        &[
            ("part", "id,snippet"),
            ("forUsername", username),
            ("key", api_key),
        ],
    )?;

    let body = fetch_text(client, url.as_str(), config.request_timeout()).await?;
    let response: ChannelsResponse = serde_json::from_str(&body)?;

    if let Some(error) = response.error {
        return Err(SourceError::Api(error.to_string()));
    }

    Ok(response.items.into_iter().next().map(|channel| ChannelInfo {
        id: channel.id,
        title: channel.snippet.title,
    }))
}

fn endpoint(api_base: &str, resource: &str) -> String {
    format!("{}/{}", api_base.trim_end_matches('/'), resource)
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    code: Option<u16>,
    #[serde(default)]
    message: String,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.code {
            Some(code) => write!(f, "{} ({})", self.message, code),
            None => f.write_str(&self.message),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchResult>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    id: SearchResultId,
    snippet: Snippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResultId {
    video_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    title: String,
    #[serde(default)]
    description: String,
    published_at: String,
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnails {
    high: Option<Thumbnail>,
    default: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

impl SearchResult {
    fn into_item(self) -> Result<ContentItem, SourceError> {
        let snippet = self.snippet;

        let description = truncate_chars(&snippet.description, MAX_DESCRIPTION_CHARS);
        let description = if description.is_empty() {
            snippet.title.clone()
        } else {
            description.into_owned()
        };

        let image = snippet
            .thumbnails
            .high
            .or(snippet.thumbnails.default)
            .map(|t| t.url)
            .unwrap_or_default();

        sanitize(ContentItem {
            url: format!("https://www.youtube.com/watch?v={}", self.id.video_id),
            date: date_part(&snippet.published_at).to_string(),
            title: snippet.title,
            description,
            image,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ChannelsResponse {
    #[serde(default)]
    items: Vec<Channel>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct Channel {
    id: String,
    snippet: ChannelSnippet,
}

#[derive(Debug, Deserialize)]
struct ChannelSnippet {
    title: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SEARCH_RESPONSE: &str = r#"{
        "kind": "youtube#searchListResponse",
        "items": [{
            "id": { "kind": "youtube#video", "videoId": "dQw4w9WgXcQ" },
            "snippet": {
                "publishedAt": "2024-01-20T15:04:05Z",
                "channelId": "UC123",
                "title": "Jetpack Compose en 10 minutos",
                "description": "Una introducción rápida",
                "thumbnails": {
                    "default": { "url": "https://i.ytimg.com/vi/dQw4w9WgXcQ/default.jpg" },
                    "high": { "url": "https://i.ytimg.com/vi/dQw4w9WgXcQ/hqdefault.jpg" }
                }
            }
        }]
    }"#;

    fn configured(server: &MockServer) -> Config {
        let mut config = Config::default();
        config.youtube.api_base = server.uri();
        config.youtube.api_key = Some("test-key".to_string());
        config.youtube.channel_id = Some("UC123".to_string());
        config
    }

    fn result_with(description: &str, thumbnails: &str) -> SearchResult {
        let json = format!(
            r#"{{
                "id": {{ "videoId": "abc" }},
                "snippet": {{
                    "publishedAt": "2024-01-20T15:04:05Z",
                    "title": "Title",
                    "description": {description},
                    "thumbnails": {thumbnails}
                }}
            }}"#,
            description = serde_json::to_string(description).unwrap()
        );
        serde_json::from_str(&json).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_latest_video() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("key", "test-key"))
            .and(query_param("channelId", "UC123"))
            .and(query_param("order", "date"))
            .and(query_param("maxResults", "1"))
            .and(query_param("type", "video"))
            .respond_with(ResponseTemplate::new(200).set_body_string(SEARCH_RESPONSE))
            .expect(1)
            .mount(&mock_server)
            .await;

        let source = YoutubeSource::new(reqwest::Client::new(), &configured(&mock_server));
        let item = source.fetch_latest().await.unwrap().unwrap();

        assert_eq!(
            item,
            ContentItem {
                title: "Jetpack Compose en 10 minutos".to_string(),
                description: "Una introducción rápida".to_string(),
                url: "https://www.youtube.com/watch?v=dQw4w9WgXcQ".to_string(),
                date: "2024-01-20".to_string(),
                image: "https://i.ytimg.com/vi/dQw4w9WgXcQ/hqdefault.jpg".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_missing_credentials_gives_placeholder() {
        let source = YoutubeSource::new(reqwest::Client::new(), &Config::default());
        let item = source.fetch_latest().await.unwrap().unwrap();

        assert_eq!(item.title, UNCONFIGURED_TITLE);
        assert_eq!(item.url, "https://youtube.com/@devpicon");
        assert_eq!(item.image, "");
        assert!(NaiveDate::parse_from_str(&item.date, "%Y-%m-%d").is_ok());
    }

    #[test]
    fn test_placeholder_shape() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        let item = unconfigured_placeholder(&YoutubeConfig::default(), today);
        assert_eq!(item.date, "2024-03-05");
        assert_eq!(item.description, "Ve a API_SETUP.md para instrucciones");
    }

    #[tokio::test]
    async fn test_empty_items_is_none() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"items": []}"#))
            .mount(&mock_server)
            .await;

        let source = YoutubeSource::new(reqwest::Client::new(), &configured(&mock_server));
        assert!(source.fetch_latest().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_api_error_object() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(400).set_body_string(
                r#"{"error": {"code": 400, "message": "API key not valid. Please pass a valid API key."}}"#,
            ))
            .mount(&mock_server)
            .await;

        let source = YoutubeSource::new(reqwest::Client::new(), &configured(&mock_server));
        match source.fetch_latest().await {
            Err(SourceError::Api(msg)) => assert!(msg.contains("API key not valid")),
            other => panic!("Expected Api error, got {:?}", other),
        }
        assert!(source.attempt().await.is_none());
    }

    #[tokio::test]
    async fn test_non_json_body() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
            .mount(&mock_server)
            .await;

        let source = YoutubeSource::new(reqwest::Client::new(), &configured(&mock_server));
        assert!(matches!(
            source.fetch_latest().await,
            Err(SourceError::Json(_))
        ));
    }

    #[test]
    fn test_description_truncated_to_200_chars() {
        let long = "á".repeat(250);
        let item = result_with(&long, "{}").into_item().unwrap();
        assert_eq!(item.description.chars().count(), 200);
    }

    #[test]
    fn test_empty_description_falls_back_to_title() {
        let item = result_with("", "{}").into_item().unwrap();
        assert_eq!(item.description, "Title");
    }

    #[test]
    fn test_thumbnail_fallbacks() {
        let item = result_with("d", r#"{"default": {"url": "https://i.ytimg.com/d.jpg"}}"#)
            .into_item()
            .unwrap();
        assert_eq!(item.image, "https://i.ytimg.com/d.jpg");

        let item = result_with("d", "{}").into_item().unwrap();
        assert_eq!(item.image, "");
    }

    #[tokio::test]
    async fn test_lookup_channel_id() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/channels"))
            .and(query_param("forUsername", "devpicon"))
            .and(query_param("key", "k"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"items": [{"id": "UCabc", "snippet": {"title": "Devpicon"}}]}"#,
            ))
            .mount(&mock_server)
            .await;

        let config = configured(&mock_server);
        let found = lookup_channel_id(&reqwest::Client::new(), &config, "k", "devpicon")
            .await
            .unwrap();
        assert_eq!(
            found,
            Some(ChannelInfo {
                id: "UCabc".to_string(),
                title: "Devpicon".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_lookup_channel_id_not_found() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"pageInfo": {"totalResults": 0}}"#))
            .mount(&mock_server)
            .await;

        let config = configured(&mock_server);
        let found = lookup_channel_id(&reqwest::Client::new(), &config, "k", "nobody")
            .await
            .unwrap();
        assert!(found.is_none());
    }
}
