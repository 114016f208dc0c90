//! Spotify Web API catalog
//!
//! Authenticates with the client-credentials grant and looks up tracks and
//! artists through the several-ids endpoints (`/v1/tracks`, `/v1/artists`).

use crate::catalog::{AlbumMetadata, ArtistMetadata, Catalog, TrackMetadata};
use crate::config::CatalogConfig;
use crate::error::{PlaysiftError, Result};

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Tokens are refreshed this long before they actually expire
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Spotify Web API client
///
/// # Examples
///
/// ```no_run
/// use playsift::catalog::{Catalog, SpotifyCatalog};
/// use playsift::config::CatalogConfig;
///
/// # async fn example() -> playsift::error::Result<()> {
/// let config = CatalogConfig {
///     client_id: "id".to_string(),
///     client_secret: "secret".to_string(),
///     ..CatalogConfig::default()
/// };
/// let catalog = SpotifyCatalog::new(config)?;
/// let tracks = catalog.tracks(&["4uLU6hMCjMI75M1A2tKUQC".to_string()]).await?;
/// # Ok(())
/// # }
/// ```
pub struct SpotifyCatalog {
    client: Client,
    config: CatalogConfig,
    token: Mutex<Option<AccessToken>>,
}

struct AccessToken {
    value: String,
    expires_at: Instant,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

#[derive(Debug, Deserialize)]
struct TracksResponse {
    tracks: Vec<Option<SpotifyTrack>>,
}

#[derive(Debug, Deserialize)]
struct SpotifyTrack {
    id: String,
    name: String,
    #[serde(default)]
    explicit: bool,
    duration_ms: i64,
    album: SpotifyAlbum,
    #[serde(default)]
    artists: Vec<SpotifyArtistRef>,
}

#[derive(Debug, Deserialize)]
struct SpotifyAlbum {
    id: String,
    name: String,
    #[serde(default)]
    release_date: String,
    #[serde(default)]
    total_tracks: i64,
}

#[derive(Debug, Deserialize)]
struct SpotifyArtistRef {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ArtistsResponse {
    artists: Vec<Option<SpotifyArtist>>,
}

#[derive(Debug, Deserialize)]
struct SpotifyArtist {
    id: String,
    name: String,
    #[serde(default)]
    genres: Vec<String>,
    #[serde(default)]
    popularity: i64,
    #[serde(default)]
    followers: SpotifyFollowers,
}

#[derive(Debug, Default, Deserialize)]
struct SpotifyFollowers {
    #[serde(default)]
    total: i64,
}

impl From<SpotifyTrack> for TrackMetadata {
    fn from(track: SpotifyTrack) -> Self {
        Self {
            track_id: track.id,
            track_name: track.name,
            explicit: track.explicit,
            duration_ms: track.duration_ms,
            album: AlbumMetadata {
                album_id: track.album.id,
                album_name: track.album.name,
                release_date: track.album.release_date,
                total_tracks: track.album.total_tracks,
            },
            artist_ids: track.artists.into_iter().map(|a| a.id).collect(),
        }
    }
}

impl From<SpotifyArtist> for ArtistMetadata {
    fn from(artist: SpotifyArtist) -> Self {
        Self {
            artist_id: artist.id,
            artist_name: artist.name,
            genres: artist.genres,
            popularity: artist.popularity,
            followers: artist.followers.total,
        }
    }
}

impl SpotifyCatalog {
    /// Create a catalog client
    ///
    /// # Errors
    ///
    /// Returns `PlaysiftError::Config` when either credential is empty, and
    /// `PlaysiftError::Catalog` if the HTTP client cannot be built.
    pub fn new(config: CatalogConfig) -> Result<Self> {
        if config.client_id.trim().is_empty() {
            return Err(PlaysiftError::Config(
                "catalog.client_id is not set (PLAYSIFT_CATALOG_CLIENT_ID)".to_string(),
            )
            .into());
        }
        if config.client_secret.trim().is_empty() {
            return Err(PlaysiftError::Config(
                "catalog.client_secret is not set (PLAYSIFT_CATALOG_CLIENT_SECRET)".to_string(),
            )
            .into());
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .user_agent(concat!("playsift/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PlaysiftError::Catalog(format!("Failed to create HTTP client: {}", e)))?;

        tracing::info!("Initialized Spotify catalog: api_base={}", config.api_base);

        Ok(Self {
            client,
            config,
            token: Mutex::new(None),
        })
    }

    fn endpoint(&self, resource: &str) -> String {
        format!(
            "{}/v1/{}",
            self.config.api_base.trim_end_matches('/'),
            resource
        )
    }

    /// Current bearer token, requesting a new one when missing or stale
    async fn access_token(&self) -> Result<String> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.expires_at > Instant::now() + TOKEN_EXPIRY_MARGIN {
                return Ok(token.value.clone());
            }
            tracing::debug!("Catalog token expired, refreshing");
        }

        let response = self
            .client
            .post(&self.config.auth_url)
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| PlaysiftError::Catalog(format!("Token request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Token endpoint returned {}: {}", status, error_text);
            return Err(PlaysiftError::Catalog(format!(
                "Token endpoint returned {}: {}",
                status, error_text
            ))
            .into());
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| PlaysiftError::Catalog(format!("Failed to parse token response: {}", e)))?;

        let value = body.access_token.clone();
        *cached = Some(AccessToken {
            value: body.access_token,
            expires_at: Instant::now() + Duration::from_secs(body.expires_in),
        });
        Ok(value)
    }

    async fn get_by_ids<T: DeserializeOwned>(&self, resource: &str, ids: &[String]) -> Result<T> {
        let token = self.access_token().await?;
        let url = self.endpoint(resource);
        tracing::debug!("Requesting {} {} ids", ids.len(), resource);

        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .query(&[("ids", ids.join(","))])
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Catalog request failed: {}", e);
                PlaysiftError::Catalog(format!("Catalog request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Catalog returned error {}: {}", status, error_text);
            return Err(PlaysiftError::Catalog(format!(
                "Catalog returned error {} for {}: {}",
                status, resource, error_text
            ))
            .into());
        }

        Ok(response.json().await.map_err(|e| {
            PlaysiftError::Catalog(format!("Failed to parse {} response: {}", resource, e))
        })?)
    }
}

#[async_trait]
impl Catalog for SpotifyCatalog {
    async fn tracks(&self, ids: &[String]) -> Result<Vec<TrackMetadata>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let body: TracksResponse = self.get_by_ids("tracks", ids).await?;
        Ok(body.tracks.into_iter().flatten().map(Into::into).collect())
    }

    async fn artists(&self, ids: &[String]) -> Result<Vec<ArtistMetadata>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let body: ArtistsResponse = self.get_by_ids("artists", ids).await?;
        Ok(body.artists.into_iter().flatten().map(Into::into).collect())
    }
}
