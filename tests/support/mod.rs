#![allow(dead_code)]

use echo::db::Database;
use echo::import::SymphoniaExtractor;
use echo::library::{LibraryManager, SharedLibraryManager};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Initialize tracing for tests with proper test output handling
pub fn tracing_init() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Library backed by a fresh SQLite file inside `temp_dir`
pub async fn setup_library(temp_dir: &TempDir) -> SharedLibraryManager {
    let db_path = temp_dir.path().join("library.db");
    let database = Database::new(db_path.to_str().unwrap())
        .await
        .expect("Failed to create database");

    SharedLibraryManager::new(LibraryManager::new(
        database,
        Arc::new(SymphoniaExtractor::new()),
    ))
}

/// Write a short 16-bit mono PCM WAV file
pub fn write_wav(path: &Path, millis: u32) {
    let sample_rate: u32 = 8000;
    let data_len: u32 = sample_rate * 2 * millis / 1000;
    let mut bytes = Vec::with_capacity(44 + data_len as usize);
    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
    bytes.extend_from_slice(b"WAVE");
    bytes.extend_from_slice(b"fmt ");
    bytes.extend_from_slice(&16u32.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&sample_rate.to_le_bytes());
    bytes.extend_from_slice(&(sample_rate * 2).to_le_bytes());
    bytes.extend_from_slice(&2u16.to_le_bytes());
    bytes.extend_from_slice(&16u16.to_le_bytes());
    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&data_len.to_le_bytes());
    bytes.resize(44 + data_len as usize, 0);
    std::fs::write(path, bytes).unwrap();
}

/// Create `count` playable WAV files named `track00.wav`, `track01.wav`, ...
pub fn write_tracks(dir: &Path, count: usize) -> Vec<PathBuf> {
    std::fs::create_dir_all(dir).unwrap();
    (0..count)
        .map(|i| {
            let path = dir.join(format!("track{:02}.wav", i));
            write_wav(&path, 100);
            path
        })
        .collect()
}
