use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Errors raised while persisting the content document.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize content document: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl StorageError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        StorageError::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

// ============================================================================
// Content Types
// ============================================================================

/// One externally-sourced content unit: a video, a podcast episode or an article.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentItem {
    pub title: String,
    pub description: String,
    pub url: String,
    /// Calendar date, `YYYY-MM-DD`.
    pub date: String,
    /// Image URL, empty when the source has none.
    pub image: String,
}

/// The newest item of each slot, as fetched during this run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LatestContent {
    pub video: Option<ContentItem>,
    pub podcast: Option<ContentItem>,
    pub blog: Option<ContentItem>,
}

impl LatestContent {
    /// Slots in display order, with their labels.
    pub fn slots(&self) -> [(&'static str, Option<&ContentItem>); 3] {
        [
            ("Video", self.video.as_ref()),
            ("Podcast", self.podcast.as_ref()),
            ("Blog", self.blog.as_ref()),
        ]
    }
}

/// One slot of the persisted document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Slot {
    /// Built from upstream data during this run.
    Fresh(ContentItem),
    /// Carried over from the previous document, exactly as it was written.
    ///
    /// Unknown keys and odd value types are kept so a run without fresh data
    /// never rewrites what it did not fetch.
    Kept(serde_json::Map<String, serde_json::Value>),
}

impl Slot {
    pub fn title(&self) -> &str {
        match self {
            Slot::Fresh(item) => &item.title,
            Slot::Kept(map) => map
                .get("title")
                .and_then(serde_json::Value::as_str)
                .unwrap_or_default(),
        }
    }

    /// The typed item, when this slot was built during the run.
    pub fn as_fresh(&self) -> Option<&ContentItem> {
        match self {
            Slot::Fresh(item) => Some(item),
            Slot::Kept(_) => None,
        }
    }
}

impl From<ContentItem> for Slot {
    fn from(item: ContentItem) -> Self {
        Slot::Fresh(item)
    }
}

/// The three slots of the persisted document. `None` is written as `{}`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PersistedContent {
    #[serde(default, with = "slot")]
    pub video: Option<Slot>,
    #[serde(default, with = "slot")]
    pub podcast: Option<Slot>,
    #[serde(default, with = "slot")]
    pub blog: Option<Slot>,
}

impl PersistedContent {
    /// Slots in display order, with their labels.
    pub fn slots(&self) -> [(&'static str, Option<&Slot>); 3] {
        [
            ("Video", self.video.as_ref()),
            ("Podcast", self.podcast.as_ref()),
            ("Blog", self.blog.as_ref()),
        ]
    }
}

/// The persisted artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentDocument {
    #[serde(default)]
    pub latest_content: PersistedContent,
    /// Time of the write that produced this document, not of the content.
    #[serde(with = "iso_millis")]
    pub last_updated: DateTime<Utc>,
}

/// Serde adapter mapping `Option<Slot>` to an item object or `{}`.
///
/// On the way in, `{}` and `null` become `None`; any other object is kept
/// verbatim as [`Slot::Kept`]. A value that is not an object cannot be a slot
/// and reads as `None`.
mod slot {
    use super::Slot;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(value: &Option<Slot>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(slot) => slot.serialize(serializer),
            None => serde_json::Map::new().serialize(serializer),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Slot>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        match value {
            serde_json::Value::Object(map) if map.is_empty() => Ok(None),
            serde_json::Value::Object(map) => Ok(Some(Slot::Kept(map))),
            serde_json::Value::Null => Ok(None),
            other => {
                tracing::warn!(value = %other, "Ignoring non-object slot in previous document");
                Ok(None)
            }
        }
    }
}

/// Timestamps written like JavaScript's `toISOString()`: `2024-01-20T10:15:30.123Z`.
mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

impl ContentDocument {
    /// `lastUpdated` formatted the way it is persisted.
    pub fn last_updated_string(&self) -> String {
        self.last_updated
            .to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}
