//! Sub-genre list loading
//!
//! The list is stored either as a JSON array of strings or as a text file
//! with one label per line.

use crate::error::{PlaysiftError, Result};
use std::path::Path;
use tracing::debug;

/// Load sub-genre labels from `path`
///
/// A file whose first non-whitespace character is `[` is parsed as a JSON
/// array. Otherwise each trimmed line is a label; blank lines and lines
/// starting with `#` are skipped.
///
/// # Errors
///
/// Returns `PlaysiftError::Catalog` if the file cannot be read or the JSON
/// form is malformed.
pub fn load_genres(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        PlaysiftError::Catalog(format!("Failed to read {}: {}", path.display(), e))
    })?;

    let genres = parse_genres(&content)
        .map_err(|e| PlaysiftError::Catalog(format!("{}: {}", path.display(), e)))?;

    debug!("Loaded {} sub-genres from {}", genres.len(), path.display());
    Ok(genres)
}

/// Parse catalog text in either supported form
pub fn parse_genres(content: &str) -> std::result::Result<Vec<String>, String> {
    if content.trim_start().starts_with('[') {
        return serde_json::from_str::<Vec<String>>(content).map_err(|e| e.to_string());
    }

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}
