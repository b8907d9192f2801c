//! Feed retrieval and parsing.
//!
//! - [`fetcher`] - HTTP GET returning the body as text, bounded in size and time
//! - [`extract`] - tag extraction from RSS fragments (Medium articles)
//! - [`parser`] - full feed parsing with `feed-rs` (podcast episodes)

mod extract;
mod fetcher;
mod parser;

pub use extract::{extract_tag, first_item};
pub use fetcher::{fetch_text, FetchError, MAX_BODY_SIZE};
pub use parser::{parse_latest_entry, ParseError, ParsedEntry};
