use playsift::history::{directory_digest, sync_history, SyncReport};

mod common;

#[test]
fn test_sync_spans_across_files() {
    let (store, _db) = common::create_temp_store();
    let data = tempfile::tempdir().unwrap();

    common::write_export(
        data.path(),
        "Streaming_History_Audio_2023.json",
        &[
            common::track_span("2023-12-31T23:00:00Z", "aaa", "First"),
            common::episode_span("2023-12-31T23:30:00Z"),
        ],
    );
    common::write_export(
        data.path(),
        "Streaming_History_Audio_2024.json",
        &[
            common::track_span("2024-01-01T01:00:00Z", "bbb", "Second"),
            common::track_span("2024-01-01T02:00:00Z", "aaa", "First"),
        ],
    );

    let report = sync_history(&store, data.path()).unwrap();

    assert_eq!(
        report,
        SyncReport {
            total_spans: 4,
            valid_spans: 3,
            filtered: 1,
            songs: 2,
            plays: 3,
            skipped: false,
        }
    );

    let plays = store.plays().unwrap();
    let ids: Vec<&str> = plays.iter().map(|p| p.track_id.as_str()).collect();
    assert_eq!(ids, vec!["aaa", "bbb", "aaa"]);
    assert_eq!(
        store.last_digest().unwrap(),
        Some(directory_digest(data.path()).unwrap())
    );
}

#[test]
fn test_resync_after_new_export_file() {
    let (store, _db) = common::create_temp_store();
    let data = tempfile::tempdir().unwrap();
    common::write_export(
        data.path(),
        "a.json",
        &[common::track_span("2024-01-01T00:00:00Z", "aaa", "First")],
    );

    assert!(!sync_history(&store, data.path()).unwrap().skipped);
    assert!(sync_history(&store, data.path()).unwrap().skipped);

    common::write_export(
        data.path(),
        "b.json",
        &[common::track_span("2024-02-01T00:00:00Z", "ccc", "Third")],
    );
    let report = sync_history(&store, data.path()).unwrap();

    assert!(!report.skipped);
    assert_eq!(store.song_count().unwrap(), 2);
    assert_eq!(store.play_count().unwrap(), 2);
}

#[test]
fn test_empty_export_directory() {
    let (store, _db) = common::create_temp_store();
    let data = tempfile::tempdir().unwrap();

    let report = sync_history(&store, data.path()).unwrap();

    assert_eq!(report.total_spans, 0);
    assert_eq!(store.play_count().unwrap(), 0);
}
