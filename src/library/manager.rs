use crate::db::{Database, DbSong, ALL_SONGS_PLAYLIST};
use crate::import::{ExtractionError, MetadataExtractor, SongImporter};
use crate::paths::normalize_path;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Song already exists in library: {0}")]
    Duplicate(PathBuf),
    #[error("Metadata extraction failed: {0}")]
    Extraction(#[from] ExtractionError),
    #[error("Import error: {0}")]
    Import(String),
}

/// The main library manager for song persistence
///
/// Handles:
/// - Insert-if-absent of songs keyed by normalized file path
/// - Metadata extraction for new files
/// - Query methods for library browsing
pub struct LibraryManager {
    database: Database,
    extractor: Arc<dyn MetadataExtractor>,
}

impl LibraryManager {
    /// Create a new library manager
    pub fn new(database: Database, extractor: Arc<dyn MetadataExtractor>) -> Self {
        LibraryManager {
            database,
            extractor,
        }
    }

    /// Extract metadata for a file and insert it as a new song.
    ///
    /// Fails with `LibraryError::Duplicate` when the normalized path is already in
    /// the library; extraction is skipped in that case.
    pub async fn add_song(&self, path: &Path) -> Result<DbSong, LibraryError> {
        let path = normalize_path(path);
        let key = path.to_string_lossy().to_string();

        if self.database.song_exists_by_path(&key).await? {
            debug!("Skipping {:?}, already in library", path);
            return Err(LibraryError::Duplicate(path));
        }

        // Tag reading is synchronous file I/O
        let extractor = self.extractor.clone();
        let extract_path = path.clone();
        let metadata = tokio::task::spawn_blocking(move || extractor.extract(&extract_path))
            .await
            .map_err(|e| LibraryError::Import(format!("Extraction task failed: {}", e)))??;

        let file_size = tokio::fs::metadata(&path).await?.len();
        let song = DbSong::from_metadata(&path, metadata, file_size);

        // A concurrent insert of the same path lands here as an ignored row
        if !self.database.insert_song(&song).await? {
            return Err(LibraryError::Duplicate(path));
        }

        info!("Added song '{}' from {:?}", song.title, path);
        Ok(song)
    }

    pub async fn get_song_by_path(&self, path: &Path) -> Result<Option<DbSong>, LibraryError> {
        let key = normalize_path(path).to_string_lossy().to_string();
        Ok(self.database.get_song_by_path(&key).await?)
    }

    pub async fn get_songs(&self) -> Result<Vec<DbSong>, LibraryError> {
        Ok(self.database.get_songs().await?)
    }

    pub async fn song_count(&self) -> Result<usize, LibraryError> {
        Ok(self.database.count_songs().await? as usize)
    }

    /// Songs of the default playlist, in the order they were imported
    pub async fn get_all_songs_playlist(&self) -> Result<Vec<DbSong>, LibraryError> {
        Ok(self.database.get_playlist_songs(ALL_SONGS_PLAYLIST).await?)
    }
}

/// Shared handle to the library manager used by the import worker and callers
#[derive(Clone)]
pub struct SharedLibraryManager {
    inner: Arc<LibraryManager>,
}

impl SharedLibraryManager {
    pub fn new(library_manager: LibraryManager) -> Self {
        SharedLibraryManager {
            inner: Arc::new(library_manager),
        }
    }

    pub fn get(&self) -> &LibraryManager {
        &self.inner
    }
}

#[async_trait]
impl SongImporter for SharedLibraryManager {
    async fn import_song(&self, path: &Path) -> Result<(), LibraryError> {
        self.inner.add_song(path).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::AudioMetadata;
    use tempfile::TempDir;

    struct TitleFromName;

    impl MetadataExtractor for TitleFromName {
        fn extract(&self, path: &Path) -> Result<AudioMetadata, ExtractionError> {
            if path.to_string_lossy().contains("corrupt") {
                return Err(ExtractionError::Probe("bad header".to_string()));
            }
            Ok(AudioMetadata {
                title: path.file_stem().map(|s| s.to_string_lossy().to_uppercase()),
                duration_seconds: 3.0,
                ..AudioMetadata::default()
            })
        }
    }

    async fn setup() -> (LibraryManager, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("library.db");
        let database = Database::new(db_path.to_str().unwrap()).await.unwrap();
        (LibraryManager::new(database, Arc::new(TitleFromName)), temp_dir)
    }

    #[tokio::test]
    async fn test_add_song_then_duplicate() {
        let (manager, dir) = setup().await;
        let file = dir.path().join("tune.mp3");
        std::fs::write(&file, b"frames").unwrap();

        let song = manager.add_song(&file).await.unwrap();
        assert_eq!(song.title, "TUNE");
        assert_eq!(song.file_size, 6);

        let second = manager.add_song(&file).await;
        assert!(matches!(second, Err(LibraryError::Duplicate(_))));
        assert_eq!(manager.song_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_detected_through_unnormalized_path() {
        let (manager, dir) = setup().await;
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        let file = dir.path().join("sub/tune.flac");
        std::fs::write(&file, b"frames").unwrap();

        manager.add_song(&file).await.unwrap();
        let again = manager
            .add_song(&dir.path().join("sub/../sub/./tune.flac"))
            .await;
        assert!(matches!(again, Err(LibraryError::Duplicate(_))));
    }

    #[tokio::test]
    async fn test_extraction_failure_inserts_nothing() {
        let (manager, dir) = setup().await;
        let file = dir.path().join("corrupt.ogg");
        std::fs::write(&file, b"junk").unwrap();

        let result = manager.add_song(&file).await;
        assert!(matches!(result, Err(LibraryError::Extraction(_))));
        assert_eq!(manager.song_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_added_songs_join_all_songs_playlist() {
        let (manager, dir) = setup().await;
        for name in ["a.wav", "b.wav"] {
            let file = dir.path().join(name);
            std::fs::write(&file, b"x").unwrap();
            manager.add_song(&file).await.unwrap();
        }

        let playlist = manager.get_all_songs_playlist().await.unwrap();
        let titles: Vec<&str> = playlist.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "B"]);
    }
}
