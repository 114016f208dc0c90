//! Catalog enrichment of synced history
//!
//! Fetches metadata only for ids the store has not enriched yet. Tracks come
//! first because their artist credits decide which artists to fetch.

use crate::catalog::{ArtistMetadata, Catalog, TrackMetadata};
use crate::error::Result;
use crate::storage::{CatalogAlbumRow, CatalogArtistRow, CatalogSongRow, HistoryStore};
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, info};

/// Summary of one enrichment run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EnrichReport {
    pub unique_songs: usize,
    pub existing_songs: usize,
    pub new_songs: usize,
    pub songs_stored: usize,
    pub albums_stored: usize,
    pub unique_artists: usize,
    pub existing_artists: usize,
    pub new_artists: usize,
    pub artists_stored: usize,
}

/// Ids in `all` that are not in `existing`, keeping the order of `all`
fn missing_ids(all: &[String], existing: &[String]) -> Vec<String> {
    let existing: HashSet<&str> = existing.iter().map(String::as_str).collect();
    all.iter()
        .filter(|id| !existing.contains(id.as_str()))
        .cloned()
        .collect()
}

fn track_rows(tracks: Vec<TrackMetadata>) -> (Vec<CatalogSongRow>, Vec<CatalogAlbumRow>) {
    tracks
        .into_iter()
        .map(|track| {
            let album = CatalogAlbumRow {
                album_id: track.album.album_id,
                album_name: track.album.album_name,
                release_date: track.album.release_date,
                total_tracks: track.album.total_tracks,
            };
            let song = CatalogSongRow {
                track_id: track.track_id,
                track_name: track.track_name,
                explicit: track.explicit,
                duration_ms: track.duration_ms,
                album_id: album.album_id.clone(),
                artist_ids: track.artist_ids,
            };
            (song, album)
        })
        .unzip()
}

fn artist_row(artist: ArtistMetadata) -> CatalogArtistRow {
    CatalogArtistRow {
        artist_id: artist.artist_id,
        artist_name: artist.artist_name,
        genres: artist.genres,
        popularity: artist.popularity,
        followers: artist.followers,
    }
}

/// Fetch and store catalog metadata for every song and artist not yet enriched
///
/// Requests carry at most `batch_size` ids. Each batch is stored before the
/// next request, so an interrupted run keeps its progress and a rerun only
/// fetches what is still missing.
///
/// # Errors
///
/// Returns the first catalog or storage error. Batches stored before the
/// failure are kept.
pub async fn enrich_history(
    store: &HistoryStore,
    catalog: &dyn Catalog,
    batch_size: usize,
) -> Result<EnrichReport> {
    let batch_size = batch_size.max(1);
    let mut report = EnrichReport::default();

    let unique_songs = store.song_ids()?;
    let existing_songs = store.catalog_song_ids()?;
    let new_songs = missing_ids(&unique_songs, &existing_songs);
    report.unique_songs = unique_songs.len();
    report.existing_songs = existing_songs.len();
    report.new_songs = new_songs.len();
    info!(
        "Songs: {} unique, {} enriched, {} new",
        report.unique_songs, report.existing_songs, report.new_songs
    );

    for (i, batch) in new_songs.chunks(batch_size).enumerate() {
        debug!("Fetching track batch {} ({} ids)", i + 1, batch.len());
        let tracks = catalog.tracks(batch).await?;
        let (songs, albums) = track_rows(tracks);
        let (song_count, album_count) = store.insert_catalog_tracks(&songs, &albums)?;
        report.songs_stored += song_count;
        report.albums_stored += album_count;
    }

    let unique_artists = store.referenced_artist_ids()?;
    let existing_artists = store.catalog_artist_ids()?;
    let new_artists = missing_ids(&unique_artists, &existing_artists);
    report.unique_artists = unique_artists.len();
    report.existing_artists = existing_artists.len();
    report.new_artists = new_artists.len();
    info!(
        "Artists: {} unique, {} enriched, {} new",
        report.unique_artists, report.existing_artists, report.new_artists
    );

    for (i, batch) in new_artists.chunks(batch_size).enumerate() {
        debug!("Fetching artist batch {} ({} ids)", i + 1, batch.len());
        let artists: Vec<CatalogArtistRow> = catalog
            .artists(batch)
            .await?
            .into_iter()
            .map(artist_row)
            .collect();
        report.artists_stored += store.insert_catalog_artists(&artists)?;
    }

    Ok(report)
}
