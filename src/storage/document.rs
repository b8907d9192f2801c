use serde::Deserialize;
use std::io::Write;
use std::path::Path;

use super::types::{ContentDocument, PersistedContent, StorageError};

/// The parts of a previous document that matter for fallback.
///
/// `lastUpdated` is not read back: it is restamped on every write, and a file
/// with a broken timestamp still has usable slots.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PreviousDocument {
    #[serde(default)]
    latest_content: PersistedContent,
}

/// Reads the slots of the previously persisted document.
///
/// Slots come back as [`Slot::Kept`](super::Slot::Kept) objects, exactly as
/// they were written. Never fails: a missing file, an unreadable file or invalid JSON all mean
/// "no previous document" and are logged as warnings.
pub fn load_previous(path: &Path) -> Option<PersistedContent> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(path = %path.display(), "No previous content document, starting fresh");
            return None;
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Could not read previous content document, starting fresh");
            return None;
        }
    };

    match serde_json::from_str::<PreviousDocument>(&raw) {
        Ok(previous) => {
            tracing::debug!(path = %path.display(), "Loaded previous content document");
            Some(previous.latest_content)
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Previous content document is not valid JSON, starting fresh");
            None
        }
    }
}

/// Renders a document as 2-space indented JSON with a trailing newline.
pub fn to_pretty_json(document: &ContentDocument) -> Result<String, StorageError> {
    let mut json = serde_json::to_string_pretty(document)?;
    json.push('\n');
    Ok(json)
}

/// Overwrites `path` with the document, atomically.
///
/// Writes to a temp file next to the target, syncs it, then renames it over the
/// target, so readers never observe a half-written document. The parent
/// directory is created when missing.
pub fn save(document: &ContentDocument, path: &Path) -> Result<(), StorageError> {
    let json = to_pretty_json(document)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
    }

    // Randomized suffix so a stale temp file from a crashed run never collides
    use std::time::{SystemTime, UNIX_EPOCH};
    let random_suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let temp_path = path.with_extension(format!("tmp.{:016x}", random_suffix));

    let mut temp_file = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&temp_path)
        .map_err(|e| StorageError::io(&temp_path, e))?;

    let written = temp_file
        .write_all(json.as_bytes())
        .and_then(|()| temp_file.sync_all());
    if let Err(e) = written {
        let _ = std::fs::remove_file(&temp_path);
        return Err(StorageError::io(&temp_path, e));
    }
    drop(temp_file);

    // On Windows, rename fails if destination exists, so remove it first
    #[cfg(windows)]
    if path.exists() {
        if let Err(e) = std::fs::remove_file(path) {
            let _ = std::fs::remove_file(&temp_path);
            return Err(StorageError::io(path, e));
        }
    }

    if let Err(e) = std::fs::rename(&temp_path, path) {
        let _ = std::fs::remove_file(&temp_path);
        return Err(StorageError::io(path, e));
    }

    tracing::debug!(path = %path.display(), bytes = json.len(), "Content document written");
    Ok(())
}
