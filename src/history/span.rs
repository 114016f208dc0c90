//! Streaming-history export records

use crate::error::{PlaysiftError, Result};
use crate::storage::{PlayRow, SongRow};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// One playback record from an extended streaming-history export
///
/// Only `ts` and `ms_played` are required; everything else tolerates
/// absence or `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamingSpan {
    pub ts: DateTime<Utc>,
    #[serde(default)]
    pub platform: String,
    pub ms_played: i64,
    #[serde(default)]
    pub conn_country: String,
    #[serde(default)]
    pub ip_addr: Option<String>,
    #[serde(default)]
    pub master_metadata_track_name: Option<String>,
    #[serde(default)]
    pub master_metadata_album_artist_name: Option<String>,
    #[serde(default)]
    pub master_metadata_album_album_name: Option<String>,
    #[serde(default)]
    pub spotify_track_uri: Option<String>,
    #[serde(default)]
    pub episode_name: Option<String>,
    #[serde(default)]
    pub episode_show_name: Option<String>,
    #[serde(default)]
    pub spotify_episode_uri: Option<String>,
    #[serde(default)]
    pub reason_start: Option<String>,
    #[serde(default)]
    pub reason_end: Option<String>,
    #[serde(default)]
    pub shuffle: bool,
    #[serde(default)]
    pub skipped: Option<bool>,
    #[serde(default)]
    pub offline: Option<bool>,
    #[serde(default)]
    pub offline_timestamp: Option<i64>,
    #[serde(default)]
    pub incognito_mode: bool,
}

impl StreamingSpan {
    /// Whether this span describes a fully identified track
    ///
    /// Podcast episodes and spans with missing metadata are not valid.
    pub fn is_valid(&self) -> bool {
        self.spotify_track_uri.is_some()
            && self.master_metadata_track_name.is_some()
            && self.master_metadata_album_artist_name.is_some()
            && self.master_metadata_album_album_name.is_some()
    }

    /// Last `:`-separated segment of the track URI
    ///
    /// # Examples
    ///
    /// ```
    /// # use playsift::history::StreamingSpan;
    /// let span: StreamingSpan = serde_json::from_str(
    ///     r#"{"ts": "2024-01-01T00:00:00Z", "ms_played": 1, "spotify_track_uri": "spotify:track:4uLU6hMCjMI75M1A2tKUQC"}"#,
    /// ).unwrap();
    /// assert_eq!(span.track_id(), Some("4uLU6hMCjMI75M1A2tKUQC"));
    /// ```
    pub fn track_id(&self) -> Option<&str> {
        self.spotify_track_uri
            .as_deref()
            .and_then(|uri| uri.rsplit(':').next())
    }

    /// The `songs` row for this span, if it is valid
    pub fn to_song(&self) -> Option<SongRow> {
        if !self.is_valid() {
            return None;
        }
        Some(SongRow {
            track_id: self.track_id()?.to_string(),
            track_name: self.master_metadata_track_name.clone()?,
            album_artist_name: self.master_metadata_album_artist_name.clone()?,
            album_name: self.master_metadata_album_album_name.clone()?,
        })
    }

    /// The `plays` row for this span, if it is valid
    pub fn to_play(&self) -> Option<PlayRow> {
        if !self.is_valid() {
            return None;
        }
        Some(PlayRow {
            ts: self.ts,
            track_id: self.track_id()?.to_string(),
            ms_played: self.ms_played,
        })
    }
}

/// Load every `*.json` file directly inside `dir`, sorted by timestamp
///
/// # Errors
///
/// Returns `PlaysiftError::History` if the directory cannot be listed or a
/// file is not a JSON array of spans.
pub fn load_history(dir: &Path) -> Result<Vec<StreamingSpan>> {
    let entries = std::fs::read_dir(dir).map_err(|e| {
        PlaysiftError::History(format!("Failed to read {}: {}", dir.display(), e))
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    files.sort();

    let mut spans = Vec::new();
    for file in &files {
        let content = std::fs::read_to_string(file)?;
        let mut batch: Vec<StreamingSpan> = serde_json::from_str(&content).map_err(|e| {
            PlaysiftError::History(format!("Failed to parse {}: {}", file.display(), e))
        })?;
        debug!("Loaded {} spans from {}", batch.len(), file.display());
        spans.append(&mut batch);
    }

    spans.sort_by_key(|s| s.ts);
    Ok(spans)
}
