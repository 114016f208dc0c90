//! Streaming-history ingestion
//!
//! Loads an exported history directory, keeps the spans that identify a
//! track, and mirrors them into a [`HistoryStore`]. A directory whose digest
//! matches the last import is skipped. Synced songs can then be enriched
//! with catalog metadata.

pub mod digest;
pub mod enrich;
pub mod span;

pub use digest::directory_digest;
pub use enrich::{enrich_history, EnrichReport};
pub use span::{load_history, StreamingSpan};

use crate::error::Result;
use crate::storage::{HistoryStore, SongRow};
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};

/// Summary of one sync run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub total_spans: usize,
    pub valid_spans: usize,
    pub filtered: usize,
    pub songs: usize,
    pub plays: usize,
    /// The directory was unchanged since the last sync
    pub skipped: bool,
}

/// Mirror `dir` into `store`, replacing all previously imported data
///
/// # Errors
///
/// Returns an error if the directory cannot be read or parsed, or if the
/// store fails. The store is left untouched when loading fails.
pub fn sync_history(store: &HistoryStore, dir: &Path) -> Result<SyncReport> {
    let digest = directory_digest(dir)?;
    if store.last_digest()?.as_deref() == Some(digest.as_str()) {
        info!("History in {} is unchanged, skipping sync", dir.display());
        return Ok(SyncReport {
            skipped: true,
            ..Default::default()
        });
    }

    let spans = load_history(dir)?;
    let total_spans = spans.len();

    let mut seen = HashSet::new();
    let mut songs: Vec<SongRow> = Vec::new();
    let mut plays = Vec::new();
    for span in spans.iter().filter(|s| s.is_valid()) {
        if let Some(song) = span.to_song() {
            if seen.insert(song.track_id.clone()) {
                songs.push(song);
            }
        }
        plays.extend(span.to_play());
    }

    let valid_spans = plays.len();
    info!(
        "Total spans: {}, valid spans: {} (filtered out {})",
        total_spans,
        valid_spans,
        total_spans - valid_spans
    );

    let (song_count, play_count) = store.replace_user_data(&songs, &plays, &digest)?;
    debug!("Recorded history digest {}", digest);

    Ok(SyncReport {
        total_spans,
        valid_spans,
        filtered: total_spans - valid_spans,
        songs: song_count,
        plays: play_count,
        skipped: false,
    })
}
