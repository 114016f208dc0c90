//! Test utilities for Playsift
//!
//! This module provides common test utilities: temporary files, assertion
//! helpers, and scripted providers that stand in for a model backend.

use crate::catalog::{AlbumMetadata, ArtistMetadata, Catalog, TrackMetadata};
use crate::config::Config;
use crate::error::{PlaysiftError, Result};
use crate::providers::{CompletionResponse, Message, Provider};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use tempfile::TempDir;

/// Create a temporary directory for testing
pub fn temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temporary directory")
}

/// Create a test file with the given content inside `dir`
pub fn create_test_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create parent directory");
    }
    std::fs::write(&path, content).expect("Failed to write test file");
    path
}

/// Assert that an error contains the expected message
///
/// # Panics
///
/// Panics if the result is Ok or if the error doesn't contain the expected message
pub fn assert_error_contains<T>(result: Result<T>, expected: &str) {
    match result {
        Ok(_) => panic!("Expected error containing '{}' but got Ok", expected),
        Err(e) => {
            let error_msg = e.to_string();
            assert!(
                error_msg.contains(expected),
                "Error message '{}' does not contain '{}'",
                error_msg,
                expected
            );
        }
    }
}

/// Create a test configuration with default values
pub fn test_config() -> Config {
    Config::default()
}

/// A small but complete configuration document
pub fn test_config_yaml() -> String {
    r#"
provider:
  type: ollama
  ollama:
    host: http://localhost:11434
    model: llama3.2:latest
    request_timeout_seconds: 60

classify:
  fundamental_genres: [rock, pop, r&b]
  retry_budget: 4
  genres_path: genres.txt
  output_path: out.json

history:
  data_dir: history
"#
    .to_string()
}

/// Provider that replays canned responses and records every request
///
/// Once the script runs out, the last response is repeated.
pub struct ScriptedProvider {
    responses: Vec<String>,
    requests: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedProvider {
    /// Replay `responses` in order
    pub fn new<S: Into<String>>(responses: Vec<S>) -> Self {
        Self {
            responses: responses.into_iter().map(Into::into).collect(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answer every request with the same text
    pub fn repeating(response: impl Into<String>) -> Self {
        Self::new(vec![response.into()])
    }

    /// Number of completed calls
    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Every message list sent so far, in call order
    pub fn requests(&self) -> Vec<Vec<Message>> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    async fn complete(&self, messages: &[Message]) -> Result<CompletionResponse> {
        let mut requests = self.requests.lock().unwrap();
        let index = requests.len();
        requests.push(messages.to_vec());

        let text = self
            .responses
            .get(index)
            .or_else(|| self.responses.last())
            .cloned()
            .unwrap_or_default();
        Ok(CompletionResponse::new(Message::assistant(text)))
    }

    fn get_current_model(&self) -> Result<String> {
        Ok("scripted".to_string())
    }
}

/// Provider whose backend is always unreachable
#[derive(Default)]
pub struct FailingProvider {
    calls: Mutex<usize>,
}

impl FailingProvider {
    /// Number of attempted calls
    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl Provider for FailingProvider {
    async fn complete(&self, _messages: &[Message]) -> Result<CompletionResponse> {
        *self.calls.lock().unwrap() += 1;
        Err(PlaysiftError::Provider("connection refused".to_string()).into())
    }
}

/// In-memory catalog that records every batch it is asked for
#[derive(Default)]
pub struct StaticCatalog {
    tracks: HashMap<String, TrackMetadata>,
    artists: HashMap<String, ArtistMetadata>,
    track_requests: Mutex<Vec<Vec<String>>>,
    artist_requests: Mutex<Vec<Vec<String>>>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a track on `album_id` credited to `artist_ids`
    pub fn with_track(mut self, track_id: &str, album_id: &str, artist_ids: &[&str]) -> Self {
        self.tracks.insert(
            track_id.to_string(),
            TrackMetadata {
                track_id: track_id.to_string(),
                track_name: format!("Track {}", track_id),
                explicit: false,
                duration_ms: 180_000,
                album: AlbumMetadata {
                    album_id: album_id.to_string(),
                    album_name: format!("Album {}", album_id),
                    release_date: "1991-09-24".to_string(),
                    total_tracks: 12,
                },
                artist_ids: artist_ids.iter().map(|a| a.to_string()).collect(),
            },
        );
        self
    }

    pub fn with_artist(mut self, artist_id: &str, genres: &[&str]) -> Self {
        self.artists.insert(
            artist_id.to_string(),
            ArtistMetadata {
                artist_id: artist_id.to_string(),
                artist_name: format!("Artist {}", artist_id),
                genres: genres.iter().map(|g| g.to_string()).collect(),
                popularity: 50,
                followers: 1000,
            },
        );
        self
    }

    /// Track id batches requested so far
    pub fn track_requests(&self) -> Vec<Vec<String>> {
        self.track_requests.lock().unwrap().clone()
    }

    /// Artist id batches requested so far
    pub fn artist_requests(&self) -> Vec<Vec<String>> {
        self.artist_requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Catalog for StaticCatalog {
    async fn tracks(&self, ids: &[String]) -> Result<Vec<TrackMetadata>> {
        self.track_requests.lock().unwrap().push(ids.to_vec());
        Ok(ids.iter().filter_map(|id| self.tracks.get(id).cloned()).collect())
    }

    async fn artists(&self, ids: &[String]) -> Result<Vec<ArtistMetadata>> {
        self.artist_requests.lock().unwrap().push(ids.to_vec());
        Ok(ids.iter().filter_map(|id| self.artists.get(id).cloned()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_dir_creation() {
        let dir = temp_dir();
        assert!(dir.path().exists());
    }

    #[test]
    fn test_create_test_file_nested() {
        let dir = temp_dir();
        let path = create_test_file(&dir, "nested/test.txt", "content");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "content");
    }

    #[test]
    fn test_assert_error_contains_success() {
        let result: Result<()> = Err(PlaysiftError::Config("test error message".into()).into());
        assert_error_contains(result, "test error");
    }

    #[test]
    #[should_panic(expected = "Expected error containing")]
    fn test_assert_error_contains_ok() {
        assert_error_contains(Ok(()), "error");
    }

    #[test]
    fn test_test_config_yaml_is_valid() {
        let config: Config = serde_yaml::from_str(&test_config_yaml()).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.classify.retry_budget, 4);
        assert!(test_config().validate().is_ok());
    }

    #[tokio::test]
    async fn test_scripted_provider_repeats_last() {
        let provider = ScriptedProvider::new(vec!["a", "b"]);
        let texts: Vec<String> = {
            let mut out = Vec::new();
            for _ in 0..3 {
                out.push(provider.complete(&[]).await.unwrap().message.content);
            }
            out
        };
        assert_eq!(texts, vec!["a", "b", "b"]);
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn test_static_catalog_omits_unknown_ids() {
        let catalog = StaticCatalog::new().with_track("t1", "al1", &["ar1"]);
        let ids = vec!["t1".to_string(), "t9".to_string()];
        let tracks = catalog.tracks(&ids).await.unwrap();
        assert_eq!(tracks.len(), 1);
        assert_eq!(catalog.track_requests(), vec![ids]);
    }

    #[tokio::test]
    async fn test_failing_provider_counts_calls() {
        let provider = FailingProvider::default();
        assert!(provider.complete(&[]).await.is_err());
        assert_eq!(provider.call_count(), 1);
    }
}
