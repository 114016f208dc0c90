use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A distinct track as stored in the `songs` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongRow {
    /// Last segment of the track URI
    pub track_id: String,
    pub track_name: String,
    pub album_artist_name: String,
    pub album_name: String,
}

/// One playback as stored in the `plays` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayRow {
    /// When playback ended
    pub ts: DateTime<Utc>,
    pub track_id: String,
    /// Milliseconds actually played
    pub ms_played: i64,
}

/// Catalog metadata for a synced track, as stored in `catalog_songs`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSongRow {
    pub track_id: String,
    pub track_name: String,
    pub explicit: bool,
    pub duration_ms: i64,
    pub album_id: String,
    /// Stored as a comma-separated list
    pub artist_ids: Vec<String>,
}

/// One row of `catalog_albums`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogAlbumRow {
    pub album_id: String,
    pub album_name: String,
    pub release_date: String,
    pub total_tracks: i64,
}

/// One row of `catalog_artists`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogArtistRow {
    pub artist_id: String,
    pub artist_name: String,
    /// Stored as a comma-separated list
    pub genres: Vec<String>,
    pub popularity: i64,
    pub followers: i64,
}

/// Split a stored comma-separated list, dropping empty entries
pub(crate) fn split_csv(csv: &str) -> Vec<String> {
    csv.split(',')
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}
