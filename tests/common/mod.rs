use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use playsift::storage::HistoryStore;

#[allow(dead_code)]
pub fn create_temp_store() -> (HistoryStore, TempDir) {
    let tmp = TempDir::new().expect("failed to create tempdir");
    let db_path = tmp.path().join("history.db");
    let store = HistoryStore::new_with_path(db_path).expect("failed to create history store");
    (store, tmp)
}

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

/// Body of a non-streaming Ollama `/api/chat` reply
#[allow(dead_code)]
pub fn ollama_reply(content: &str) -> Value {
    json!({
        "model": "test-model",
        "created_at": "2024-01-01T00:00:00Z",
        "message": { "role": "assistant", "content": content },
        "done": true,
        "prompt_eval_count": 12,
        "eval_count": 7
    })
}

/// One track span in export format
#[allow(dead_code)]
pub fn track_span(ts: &str, track_id: &str, name: &str) -> Value {
    json!({
        "ts": ts,
        "platform": "linux",
        "ms_played": 180000,
        "conn_country": "GB",
        "ip_addr": null,
        "master_metadata_track_name": name,
        "master_metadata_album_artist_name": "Artist",
        "master_metadata_album_album_name": "Album",
        "spotify_track_uri": format!("spotify:track:{}", track_id),
        "episode_name": null,
        "episode_show_name": null,
        "spotify_episode_uri": null,
        "reason_start": "clickrow",
        "reason_end": "trackdone",
        "shuffle": false,
        "skipped": false,
        "offline": false,
        "offline_timestamp": 0,
        "incognito_mode": false
    })
}

/// One podcast span, which sync filters out
#[allow(dead_code)]
pub fn episode_span(ts: &str) -> Value {
    json!({
        "ts": ts,
        "platform": "linux",
        "ms_played": 900000,
        "conn_country": "GB",
        "master_metadata_track_name": null,
        "master_metadata_album_artist_name": null,
        "master_metadata_album_album_name": null,
        "spotify_track_uri": null,
        "episode_name": "Episode",
        "episode_show_name": "Show",
        "spotify_episode_uri": "spotify:episode:abc",
        "shuffle": false,
        "incognito_mode": false
    })
}

#[allow(dead_code)]
pub fn write_export(dir: &Path, name: &str, spans: &[Value]) -> PathBuf {
    fs::create_dir_all(dir).expect("failed to create export dir");
    let path = dir.join(name);
    fs::write(&path, Value::Array(spans.to_vec()).to_string()).expect("failed to write export");
    path
}
