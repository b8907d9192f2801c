//! glean: refreshes a portfolio site's "latest content" document.
//!
//! A run reads the previous `content.json`, asks every source for its newest
//! item in parallel, keeps the previous value for any source that came back
//! empty and writes the merged document atomically.

pub mod config;
pub mod feed;
pub mod merge;
pub mod refresh;
pub mod sources;
pub mod storage;
pub mod util;
