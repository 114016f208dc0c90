//! Catalog module for Playsift
//!
//! Two collaborators live here: the local sub-genre list that feeds
//! classification, and the remote music catalog used to enrich synced
//! history with track, album and artist metadata.

pub mod base;
pub mod genres;
pub mod spotify;

pub use base::{AlbumMetadata, ArtistMetadata, Catalog, TrackMetadata};
pub use genres::{load_genres, parse_genres};
pub use spotify::SpotifyCatalog;

use crate::config::CatalogConfig;
use crate::error::Result;

/// Most ids the several-ids endpoints accept in one request
pub const MAX_BATCH_SIZE: usize = 50;

/// Create the configured metadata catalog
///
/// # Errors
///
/// Returns error if the credentials are missing or the client cannot be built
pub fn create_catalog(config: &CatalogConfig) -> Result<Box<dyn Catalog>> {
    Ok(Box::new(SpotifyCatalog::new(config.clone())?))
}
