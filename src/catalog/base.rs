//! Music catalog abstraction
//!
//! A [`Catalog`] answers metadata lookups for track and artist ids taken from
//! the synced history. Implementations own authentication and transport.

use crate::error::Result;
use async_trait::async_trait;

/// Album details carried on every track lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumMetadata {
    pub album_id: String,
    pub album_name: String,
    /// Release date as published, which may be only a year
    pub release_date: String,
    pub total_tracks: i64,
}

/// Track details returned by a catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackMetadata {
    pub track_id: String,
    pub track_name: String,
    pub explicit: bool,
    pub duration_ms: i64,
    pub album: AlbumMetadata,
    /// Credited artists, in catalog order
    pub artist_ids: Vec<String>,
}

/// Artist details returned by a catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtistMetadata {
    pub artist_id: String,
    pub artist_name: String,
    pub genres: Vec<String>,
    pub popularity: i64,
    pub followers: i64,
}

/// Remote metadata source
///
/// Callers keep each request within the implementation's batch limit.
/// Ids the catalog does not know are left out of the result.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Look up one batch of track ids
    async fn tracks(&self, ids: &[String]) -> Result<Vec<TrackMetadata>>;

    /// Look up one batch of artist ids
    async fn artists(&self, ids: &[String]) -> Result<Vec<ArtistMetadata>>;
}
