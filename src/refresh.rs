//! One refresh run: read previous → fetch all (in parallel) → merge → write.

use chrono::Utc;
use std::io::Write;
use std::path::Path;

use crate::config::Config;
use crate::merge::{build_document, freshest};
use crate::sources::{DevtoSource, MediumSource, PodcastSource, Source, YoutubeSource};
use crate::storage::{self, ContentDocument, LatestContent, Slot, StorageError};

/// The four adapters of a run.
pub struct Sources {
    pub video: Box<dyn Source>,
    pub podcast: Box<dyn Source>,
    pub article: Box<dyn Source>,
    pub article_fallback: Box<dyn Source>,
}

impl Sources {
    /// The production adapters, sharing one HTTP client.
    pub fn from_config(client: &reqwest::Client, config: &Config) -> Self {
        Self {
            video: Box::new(YoutubeSource::new(client.clone(), config)),
            podcast: Box::new(PodcastSource::new(client.clone(), config)),
            article: Box::new(DevtoSource::new(client.clone(), config)),
            article_fallback: Box::new(MediumSource::new(client.clone(), config)),
        }
    }

    /// Runs every adapter concurrently and waits for all of them.
    ///
    /// The blog slot gets whichever article is more recent.
    pub async fn fetch_all(&self) -> LatestContent {
        let (video, podcast, article, article_fallback) = tokio::join!(
            self.video.attempt(),
            self.podcast.attempt(),
            self.article.attempt(),
            self.article_fallback.attempt(),
        );

        LatestContent {
            video,
            podcast,
            blog: freshest(article, article_fallback),
        }
    }
}

/// Performs a full run against `output` and returns what was (or would be) written.
///
/// With `dry_run` the document is built but the file is left untouched.
/// Only a failed write is an error; every upstream problem has already been
/// absorbed by the adapters.
pub async fn run(
    sources: &Sources,
    output: &Path,
    dry_run: bool,
) -> Result<ContentDocument, StorageError> {
    tracing::info!(output = %output.display(), "Refreshing content");

    let previous = storage::load_previous(output);
    let fresh = sources.fetch_all().await;

    for (label, item) in fresh.slots() {
        if item.is_none() {
            tracing::info!(slot = label, "No fresh item, keeping previous value");
        }
    }

    let document = build_document(fresh, previous.as_ref(), Utc::now());

    if dry_run {
        tracing::info!("Dry run, not writing content document");
    } else {
        storage::save(&document, output)?;
        tracing::info!(output = %output.display(), "Content document updated");
    }

    Ok(document)
}

/// Writes the human-readable summary of a document.
pub fn write_summary<W: Write>(out: &mut W, document: &ContentDocument) -> std::io::Result<()> {
    writeln!(out, "Summary:")?;
    for (label, item) in document.latest_content.slots() {
        let title = item.map(Slot::title).unwrap_or("(empty)");
        writeln!(out, "   {label}: {title}")?;
    }
    writeln!(out)?;
    writeln!(out, "Last updated: {}", document.last_updated_string())
}
