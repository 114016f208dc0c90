use crate::error::{PlaysiftError, Result};
use anyhow::Context;
use directories::ProjectDirs;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

pub mod types;
use types::split_csv;
pub use types::{CatalogAlbumRow, CatalogArtistRow, CatalogSongRow, PlayRow, SongRow};

/// Storage backend for ingested streaming history
pub struct HistoryStore {
    db_path: PathBuf,
}

impl HistoryStore {
    /// Create a store in the user's data directory
    pub fn new() -> Result<Self> {
        let proj_dirs = ProjectDirs::from("com", "playsift", "playsift")
            .ok_or_else(|| PlaysiftError::Storage("Could not determine data directory".into()))?;

        Self::new_with_path(proj_dirs.data_dir().join("history.db"))
    }

    /// Create a store backed by the given database file
    ///
    /// Parent directories are created as needed.
    ///
    /// # Examples
    ///
    /// ```
    /// use playsift::storage::HistoryStore;
    ///
    /// let dir = tempfile::tempdir().unwrap();
    /// let store = HistoryStore::new_with_path(dir.path().join("history.db")).unwrap();
    /// assert_eq!(store.song_count().unwrap(), 0);
    /// ```
    pub fn new_with_path<P: Into<PathBuf>>(db_path: P) -> Result<Self> {
        let db_path = db_path.into();

        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .context("Failed to create parent directory for database")
                .map_err(|e| PlaysiftError::Storage(e.to_string()))?;
        }

        let store = Self { db_path };
        store.init()?;
        Ok(store)
    }

    /// Open the configured database, or the default one when no path is set
    pub fn open(db_path: Option<&Path>) -> Result<Self> {
        match db_path {
            Some(path) => Self::new_with_path(path),
            None => Self::new(),
        }
    }

    /// Path of the underlying database file
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn connect(&self) -> Result<Connection> {
        Ok(Connection::open(&self.db_path)
            .context("Failed to open database")
            .map_err(|e| PlaysiftError::Storage(e.to_string()))?)
    }

    /// Initialize the database schema
    fn init(&self) -> Result<()> {
        let conn = self.connect()?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS songs (
                track_id TEXT NOT NULL PRIMARY KEY,
                track_name TEXT NOT NULL,
                album_artist_name TEXT,
                album_name TEXT
            );
            CREATE TABLE IF NOT EXISTS plays (
                play_id INTEGER PRIMARY KEY AUTOINCREMENT,
                ts TEXT NOT NULL,
                track_id TEXT NOT NULL,
                ms_played INTEGER NOT NULL
            );
            CREATE TABLE IF NOT EXISTS info (
                hash_id INTEGER PRIMARY KEY AUTOINCREMENT,
                last_dir_hash TEXT
            );
            CREATE TABLE IF NOT EXISTS catalog_songs (
                track_id TEXT NOT NULL PRIMARY KEY,
                track_name TEXT NOT NULL,
                explicit BOOLEAN NOT NULL,
                duration_ms INTEGER NOT NULL,
                album_id TEXT NOT NULL,
                artist_ids_csv TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS catalog_albums (
                album_id TEXT NOT NULL PRIMARY KEY,
                album_name TEXT NOT NULL,
                release_date TEXT NOT NULL,
                total_tracks INTEGER NOT NULL
            );
            CREATE TABLE IF NOT EXISTS catalog_artists (
                artist_id TEXT NOT NULL PRIMARY KEY,
                artist_name TEXT NOT NULL,
                genres_csv TEXT NOT NULL,
                popularity INTEGER NOT NULL,
                followers INTEGER NOT NULL
            );",
        )
        .context("Failed to create tables")
        .map_err(|e| PlaysiftError::Storage(e.to_string()))?;

        Ok(())
    }

    /// Most recently recorded directory digest
    pub fn last_digest(&self) -> Result<Option<String>> {
        let conn = self.connect()?;
        let digest = conn
            .query_row(
                "SELECT last_dir_hash FROM info ORDER BY hash_id DESC LIMIT 1",
                [],
                |row| row.get::<_, Option<String>>(0),
            )
            .optional()
            .context("Failed to query last digest")
            .map_err(|e| PlaysiftError::Storage(e.to_string()))?;
        Ok(digest.flatten())
    }

    /// Append a directory digest
    pub fn record_digest(&self, digest: &str) -> Result<()> {
        let conn = self.connect()?;
        record_digest(&conn, digest)
    }

    /// Delete all songs and plays; recorded digests and catalog metadata are kept
    pub fn clear_user_data(&self) -> Result<()> {
        let conn = self.connect()?;
        clear_user_data(&conn)
    }

    /// Insert songs, skipping track ids already present
    ///
    /// Returns the number of rows actually inserted.
    pub fn insert_songs(&self, songs: &[SongRow]) -> Result<usize> {
        let mut conn = self.connect()?;
        let tx = conn
            .transaction()
            .context("Failed to start transaction")
            .map_err(|e| PlaysiftError::Storage(e.to_string()))?;
        let inserted = insert_songs(&tx, songs)?;
        commit(tx)?;
        Ok(inserted)
    }

    /// Insert plays
    pub fn insert_plays(&self, plays: &[PlayRow]) -> Result<usize> {
        let mut conn = self.connect()?;
        let tx = conn
            .transaction()
            .context("Failed to start transaction")
            .map_err(|e| PlaysiftError::Storage(e.to_string()))?;
        let inserted = insert_plays(&tx, plays)?;
        commit(tx)?;
        Ok(inserted)
    }

    /// Replace all user data and record `digest`, atomically
    ///
    /// Returns `(songs inserted, plays inserted)`.
    pub fn replace_user_data(
        &self,
        songs: &[SongRow],
        plays: &[PlayRow],
        digest: &str,
    ) -> Result<(usize, usize)> {
        let mut conn = self.connect()?;
        let tx = conn
            .transaction()
            .context("Failed to start transaction")
            .map_err(|e| PlaysiftError::Storage(e.to_string()))?;

        clear_user_data(&tx)?;
        let song_count = insert_songs(&tx, songs)?;
        let play_count = insert_plays(&tx, plays)?;
        record_digest(&tx, digest)?;

        commit(tx)?;
        Ok((song_count, play_count))
    }

    pub fn song_count(&self) -> Result<usize> {
        self.count("songs")
    }

    pub fn play_count(&self) -> Result<usize> {
        self.count("plays")
    }

    /// Every stored play in timestamp order
    pub fn plays(&self) -> Result<Vec<PlayRow>> {
        let conn = self.connect()?;
        let mut stmt = conn
            .prepare("SELECT ts, track_id, ms_played FROM plays ORDER BY ts, play_id")
            .context("Failed to prepare query")
            .map_err(|e| PlaysiftError::Storage(e.to_string()))?;

        let rows = stmt
            .query_map([], |row| {
                let ts: String = row.get(0)?;
                Ok((ts, row.get::<_, String>(1)?, row.get::<_, i64>(2)?))
            })
            .context("Failed to query plays")
            .map_err(|e| PlaysiftError::Storage(e.to_string()))?;

        let mut plays = Vec::new();
        for row in rows {
            let (ts, track_id, ms_played) =
                row.map_err(|e| PlaysiftError::Storage(e.to_string()))?;
            let ts = chrono::DateTime::parse_from_rfc3339(&ts)
                .map_err(|e| PlaysiftError::Storage(format!("Bad timestamp {}: {}", ts, e)))?
                .with_timezone(&chrono::Utc);
            plays.push(PlayRow {
                ts,
                track_id,
                ms_played,
            });
        }
        Ok(plays)
    }

    /// Track ids of every synced song, sorted
    pub fn song_ids(&self) -> Result<Vec<String>> {
        self.string_column("SELECT track_id FROM songs ORDER BY track_id")
    }

    /// Track ids that already have catalog metadata, sorted
    pub fn catalog_song_ids(&self) -> Result<Vec<String>> {
        self.string_column("SELECT track_id FROM catalog_songs ORDER BY track_id")
    }

    /// Distinct artist ids credited on enriched songs, sorted
    pub fn referenced_artist_ids(&self) -> Result<Vec<String>> {
        let ids: BTreeSet<String> = self
            .string_column("SELECT artist_ids_csv FROM catalog_songs")?
            .iter()
            .flat_map(|csv| split_csv(csv))
            .collect();
        Ok(ids.into_iter().collect())
    }

    /// Artist ids that already have catalog metadata, sorted
    pub fn catalog_artist_ids(&self) -> Result<Vec<String>> {
        self.string_column("SELECT artist_id FROM catalog_artists ORDER BY artist_id")
    }

    /// Store one batch of enriched tracks with their albums
    ///
    /// Both inserts skip ids already present and share a transaction.
    /// Returns `(songs inserted, albums inserted)`.
    pub fn insert_catalog_tracks(
        &self,
        songs: &[CatalogSongRow],
        albums: &[CatalogAlbumRow],
    ) -> Result<(usize, usize)> {
        let mut conn = self.connect()?;
        let tx = conn
            .transaction()
            .context("Failed to start transaction")
            .map_err(|e| PlaysiftError::Storage(e.to_string()))?;
        let album_count = insert_catalog_albums(&tx, albums)?;
        let song_count = insert_catalog_songs(&tx, songs)?;
        commit(tx)?;
        Ok((song_count, album_count))
    }

    /// Store one batch of enriched artists, skipping ids already present
    pub fn insert_catalog_artists(&self, artists: &[CatalogArtistRow]) -> Result<usize> {
        let mut conn = self.connect()?;
        let tx = conn
            .transaction()
            .context("Failed to start transaction")
            .map_err(|e| PlaysiftError::Storage(e.to_string()))?;
        let inserted = insert_catalog_artists(&tx, artists)?;
        commit(tx)?;
        Ok(inserted)
    }

    /// Every enriched song, ordered by track id
    pub fn catalog_songs(&self) -> Result<Vec<CatalogSongRow>> {
        let conn = self.connect()?;
        let mut stmt = conn
            .prepare(
                "SELECT track_id, track_name, explicit, duration_ms, album_id, artist_ids_csv
                FROM catalog_songs ORDER BY track_id",
            )
            .context("Failed to prepare query")
            .map_err(|e| PlaysiftError::Storage(e.to_string()))?;

        let rows = stmt
            .query_map([], |row| {
                let csv: String = row.get(5)?;
                Ok(CatalogSongRow {
                    track_id: row.get(0)?,
                    track_name: row.get(1)?,
                    explicit: row.get(2)?,
                    duration_ms: row.get(3)?,
                    album_id: row.get(4)?,
                    artist_ids: split_csv(&csv),
                })
            })
            .context("Failed to query catalog songs")
            .map_err(|e| PlaysiftError::Storage(e.to_string()))?;

        Ok(rows
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| PlaysiftError::Storage(e.to_string()))?)
    }

    /// Every enriched artist, ordered by artist id
    pub fn catalog_artists(&self) -> Result<Vec<CatalogArtistRow>> {
        let conn = self.connect()?;
        let mut stmt = conn
            .prepare(
                "SELECT artist_id, artist_name, genres_csv, popularity, followers
                FROM catalog_artists ORDER BY artist_id",
            )
            .context("Failed to prepare query")
            .map_err(|e| PlaysiftError::Storage(e.to_string()))?;

        let rows = stmt
            .query_map([], |row| {
                let csv: String = row.get(2)?;
                Ok(CatalogArtistRow {
                    artist_id: row.get(0)?,
                    artist_name: row.get(1)?,
                    genres: split_csv(&csv),
                    popularity: row.get(3)?,
                    followers: row.get(4)?,
                })
            })
            .context("Failed to query catalog artists")
            .map_err(|e| PlaysiftError::Storage(e.to_string()))?;

        Ok(rows
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| PlaysiftError::Storage(e.to_string()))?)
    }

    pub fn catalog_album_count(&self) -> Result<usize> {
        self.count("catalog_albums")
    }

    fn string_column(&self, sql: &str) -> Result<Vec<String>> {
        let conn = self.connect()?;
        let mut stmt = conn
            .prepare(sql)
            .context("Failed to prepare query")
            .map_err(|e| PlaysiftError::Storage(e.to_string()))?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .context("Failed to run query")
            .map_err(|e| PlaysiftError::Storage(e.to_string()))?;
        Ok(rows
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| PlaysiftError::Storage(e.to_string()))?)
    }

    fn count(&self, table: &str) -> Result<usize> {
        let conn = self.connect()?;
        let count: i64 = conn
            .query_row(&format!("SELECT count(*) FROM {}", table), [], |r| r.get(0))
            .with_context(|| format!("Failed to count {}", table))
            .map_err(|e| PlaysiftError::Storage(e.to_string()))?;
        Ok(count as usize)
    }
}

fn commit(tx: rusqlite::Transaction<'_>) -> Result<()> {
    tx.commit()
        .context("Failed to commit transaction")
        .map_err(|e| PlaysiftError::Storage(e.to_string()))?;
    Ok(())
}

fn record_digest(conn: &Connection, digest: &str) -> Result<()> {
    conn.execute("INSERT INTO info (last_dir_hash) VALUES (?)", params![digest])
        .context("Failed to record digest")
        .map_err(|e| PlaysiftError::Storage(e.to_string()))?;
    Ok(())
}

fn clear_user_data(conn: &Connection) -> Result<()> {
    conn.execute_batch("DELETE FROM plays; DELETE FROM songs;")
        .context("Failed to clear user data")
        .map_err(|e| PlaysiftError::Storage(e.to_string()))?;
    Ok(())
}

fn insert_songs(conn: &Connection, songs: &[SongRow]) -> Result<usize> {
    let mut stmt = conn
        .prepare(
            "INSERT INTO songs (track_id, track_name, album_artist_name, album_name)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(track_id) DO NOTHING",
        )
        .context("Failed to prepare song insert")
        .map_err(|e| PlaysiftError::Storage(e.to_string()))?;

    let mut inserted = 0;
    for song in songs {
        inserted += stmt
            .execute(params![
                song.track_id,
                song.track_name,
                song.album_artist_name,
                song.album_name
            ])
            .context("Failed to insert song")
            .map_err(|e| PlaysiftError::Storage(e.to_string()))?;
    }
    Ok(inserted)
}

fn insert_plays(conn: &Connection, plays: &[PlayRow]) -> Result<usize> {
    let mut stmt = conn
        .prepare("INSERT INTO plays (ts, track_id, ms_played) VALUES (?, ?, ?)")
        .context("Failed to prepare play insert")
        .map_err(|e| PlaysiftError::Storage(e.to_string()))?;

    for play in plays {
        stmt.execute(params![play.ts.to_rfc3339(), play.track_id, play.ms_played])
            .context("Failed to insert play")
            .map_err(|e| PlaysiftError::Storage(e.to_string()))?;
    }
    Ok(plays.len())
}

fn insert_catalog_songs(conn: &Connection, songs: &[CatalogSongRow]) -> Result<usize> {
    let mut stmt = conn
        .prepare(
            "INSERT INTO catalog_songs
            (track_id, track_name, explicit, duration_ms, album_id, artist_ids_csv)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(track_id) DO NOTHING",
        )
        .context("Failed to prepare catalog song insert")
        .map_err(|e| PlaysiftError::Storage(e.to_string()))?;

    let mut inserted = 0;
    for song in songs {
        inserted += stmt
            .execute(params![
                song.track_id,
                song.track_name,
                song.explicit,
                song.duration_ms,
                song.album_id,
                song.artist_ids.join(",")
            ])
            .context("Failed to insert catalog song")
            .map_err(|e| PlaysiftError::Storage(e.to_string()))?;
    }
    Ok(inserted)
}

fn insert_catalog_albums(conn: &Connection, albums: &[CatalogAlbumRow]) -> Result<usize> {
    let mut stmt = conn
        .prepare(
            "INSERT INTO catalog_albums (album_id, album_name, release_date, total_tracks)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(album_id) DO NOTHING",
        )
        .context("Failed to prepare catalog album insert")
        .map_err(|e| PlaysiftError::Storage(e.to_string()))?;

    let mut inserted = 0;
    for album in albums {
        inserted += stmt
            .execute(params![
                album.album_id,
                album.album_name,
                album.release_date,
                album.total_tracks
            ])
            .context("Failed to insert catalog album")
            .map_err(|e| PlaysiftError::Storage(e.to_string()))?;
    }
    Ok(inserted)
}

fn insert_catalog_artists(conn: &Connection, artists: &[CatalogArtistRow]) -> Result<usize> {
    let mut stmt = conn
        .prepare(
            "INSERT INTO catalog_artists (artist_id, artist_name, genres_csv, popularity, followers)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(artist_id) DO NOTHING",
        )
        .context("Failed to prepare catalog artist insert")
        .map_err(|e| PlaysiftError::Storage(e.to_string()))?;

    let mut inserted = 0;
    for artist in artists {
        inserted += stmt
            .execute(params![
                artist.artist_id,
                artist.artist_name,
                artist.genres.join(","),
                artist.popularity,
                artist.followers
            ])
            .context("Failed to insert catalog artist")
            .map_err(|e| PlaysiftError::Storage(e.to_string()))?;
    }
    Ok(inserted)
}
