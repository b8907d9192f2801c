mod document;
mod types;

pub use document::{load_previous, save, to_pretty_json};
pub use types::{
    ContentDocument, ContentItem, LatestContent, PersistedContent, Slot, StorageError,
};
