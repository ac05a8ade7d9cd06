use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::info;
use uuid::Uuid;

use crate::db::models::*;

#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Initialize database connection and create tables
    pub async fn new(database_path: &str) -> Result<Self, sqlx::Error> {
        // Use sqlite:// with ?mode=rwc to create if it doesn't exist
        let database_url = format!("sqlite://{}?mode=rwc", database_path);
        info!("Connecting to {}", database_url);
        let pool = SqlitePool::connect(&database_url).await?;

        let db = Database { pool };
        db.create_tables().await?;
        Ok(db)
    }

    /// Create all necessary tables
    async fn create_tables(&self) -> Result<(), sqlx::Error> {
        // Songs table, unique by normalized file path
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS songs (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                artist TEXT,
                album TEXT,
                duration_seconds REAL,
                file_path TEXT NOT NULL UNIQUE,
                file_size INTEGER,
                format TEXT,
                album_art BLOB,
                album_art_format TEXT,
                play_count INTEGER NOT NULL DEFAULT 0,
                date_added TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS playlists (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Playlist-Song junction table
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS playlist_songs (
                id TEXT PRIMARY KEY,
                playlist_id TEXT NOT NULL,
                song_id TEXT NOT NULL,
                position INTEGER NOT NULL,
                added_at TEXT NOT NULL,
                FOREIGN KEY (playlist_id) REFERENCES playlists (id) ON DELETE CASCADE,
                FOREIGN KEY (song_id) REFERENCES songs (id) ON DELETE CASCADE,
                UNIQUE(playlist_id, song_id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_songs_artist ON songs (artist)")
            .execute(&self.pool)
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_songs_album ON songs (album)")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_playlist_songs_playlist ON playlist_songs (playlist_id)",
        )
        .execute(&self.pool)
        .await?;

        // Default playlist every import lands in
        let all_songs = DbPlaylist::new(ALL_SONGS_PLAYLIST);
        sqlx::query("INSERT OR IGNORE INTO playlists (id, name, created_at) VALUES (?, ?, ?)")
            .bind(&all_songs.id)
            .bind(&all_songs.name)
            .bind(all_songs.created_at.to_rfc3339())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Check whether a song with this file path is already in the library
    pub async fn song_exists_by_path(&self, file_path: &str) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM songs WHERE file_path = ?")
            .bind(file_path)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.is_some())
    }

    /// Insert a song and append it to the "All Songs" playlist in one transaction.
    ///
    /// Returns `false` without touching anything if a song with the same file path
    /// already exists.
    pub async fn insert_song(&self, song: &DbSong) -> Result<bool, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO songs (
                id, title, artist, album, duration_seconds, file_path, file_size,
                format, album_art, album_art_format, play_count, date_added
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&song.id)
        .bind(&song.title)
        .bind(&song.artist)
        .bind(&song.album)
        .bind(song.duration_seconds)
        .bind(&song.file_path)
        .bind(song.file_size)
        .bind(&song.format)
        .bind(song.album_art.as_deref())
        .bind(&song.album_art_format)
        .bind(song.play_count)
        .bind(song.date_added.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        let playlist_id: Option<String> =
            sqlx::query_scalar("SELECT id FROM playlists WHERE name = ?")
                .bind(ALL_SONGS_PLAYLIST)
                .fetch_optional(&mut *tx)
                .await?;

        if let Some(playlist_id) = playlist_id {
            let max_position: Option<i64> = sqlx::query_scalar(
                "SELECT MAX(position) FROM playlist_songs WHERE playlist_id = ?",
            )
            .bind(&playlist_id)
            .fetch_one(&mut *tx)
            .await?;

            sqlx::query(
                r#"
                INSERT INTO playlist_songs (id, playlist_id, song_id, position, added_at)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&playlist_id)
            .bind(&song.id)
            .bind(max_position.unwrap_or(0) + 1)
            .bind(Utc::now().to_rfc3339())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(true)
    }

    /// Get song by file path
    pub async fn get_song_by_path(&self, file_path: &str) -> Result<Option<DbSong>, sqlx::Error> {
        let row = sqlx::query("SELECT * FROM songs WHERE file_path = ?")
            .bind(file_path)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| song_from_row(&row)).transpose()
    }

    /// Get all songs, most recently added first
    pub async fn get_songs(&self) -> Result<Vec<DbSong>, sqlx::Error> {
        let rows = sqlx::query("SELECT * FROM songs ORDER BY date_added DESC")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(song_from_row).collect()
    }

    pub async fn count_songs(&self) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM songs")
            .fetch_one(&self.pool)
            .await
    }

    /// Get the songs of a playlist in playlist order
    pub async fn get_playlist_songs(&self, playlist_name: &str) -> Result<Vec<DbSong>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT s.* FROM songs s
            JOIN playlist_songs ps ON s.id = ps.song_id
            JOIN playlists p ON p.id = ps.playlist_id
            WHERE p.name = ?
            ORDER BY ps.position
            "#,
        )
        .bind(playlist_name)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(song_from_row).collect()
    }
}

fn song_from_row(row: &SqliteRow) -> Result<DbSong, sqlx::Error> {
    let date_added = DateTime::parse_from_rfc3339(&row.get::<String, _>("date_added"))
        .map_err(|e| sqlx::Error::Decode(Box::new(e)))?
        .with_timezone(&Utc);

    Ok(DbSong {
        id: row.get("id"),
        title: row.get("title"),
        artist: row.get("artist"),
        album: row.get("album"),
        duration_seconds: row.get("duration_seconds"),
        file_path: row.get("file_path"),
        file_size: row.get("file_size"),
        format: row.get("format"),
        album_art: row.get("album_art"),
        album_art_format: row.get("album_art_format"),
        play_count: row.get("play_count"),
        date_added,
    })
}
