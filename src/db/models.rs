use crate::import::{AudioFormat, AudioMetadata};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

/// Name of the playlist every imported song is appended to
pub const ALL_SONGS_PLAYLIST: &str = "All Songs";

const UNKNOWN_ARTIST: &str = "Unknown Artist";
const UNKNOWN_ALBUM: &str = "Unknown Album";

/// Song metadata
///
/// One row per audio file. `file_path` is the normalized absolute path and is
/// unique: the library never holds two songs for the same file, and an existing
/// row is never updated by an import.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DbSong {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub duration_seconds: f64,
    pub file_path: String,
    pub file_size: i64,
    /// Container format from the file extension ("mp3", "flac", ...)
    pub format: Option<String>,
    #[serde(skip)]
    pub album_art: Option<Vec<u8>>,
    pub album_art_format: Option<String>,
    pub play_count: i64,
    pub date_added: DateTime<Utc>,
}

impl DbSong {
    /// Build a new song row from extracted tags.
    ///
    /// Missing title falls back to the file stem; missing artist and album fall
    /// back to the "Unknown" placeholders.
    pub fn from_metadata(path: &Path, metadata: AudioMetadata, file_size: u64) -> Self {
        let title = metadata.title.unwrap_or_else(|| {
            path.file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| path.to_string_lossy().to_string())
        });

        let (album_art, album_art_format) = match metadata.cover_image {
            Some(cover) => (Some(cover.data), Some(cover.format)),
            None => (None, None),
        };

        DbSong {
            id: Uuid::new_v4().to_string(),
            title,
            artist: metadata
                .artist
                .unwrap_or_else(|| UNKNOWN_ARTIST.to_string()),
            album: metadata.album.unwrap_or_else(|| UNKNOWN_ALBUM.to_string()),
            duration_seconds: metadata.duration_seconds,
            file_path: path.to_string_lossy().to_string(),
            file_size: file_size as i64,
            format: AudioFormat::from_path(path).map(|f| f.as_str().to_string()),
            album_art,
            album_art_format,
            play_count: 0,
            date_added: Utc::now(),
        }
    }
}

/// A named, ordered list of songs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DbPlaylist {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl DbPlaylist {
    pub fn new(name: &str) -> Self {
        DbPlaylist {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            created_at: Utc::now(),
        }
    }
}
