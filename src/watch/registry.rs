use crate::import::{scan_directory, BatchStatistics, ImportError, ImportHandle, ScanError};
use crate::paths::normalize_path;
use crate::settings::{SettingsError, SettingsStore};
use crate::watch::watcher::{WatchBackend, WatcherError};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Folder is already being watched: {0}")]
    AlreadyWatched(PathBuf),
    #[error("Directory does not exist: {0}")]
    DirectoryNotFound(PathBuf),
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("Scan failed: {0}")]
    Scan(#[from] ScanError),
    #[error("Watcher error: {0}")]
    Watcher(#[from] WatcherError),
    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),
    #[error("Import error: {0}")]
    Import(#[from] ImportError),
    #[error("Scan task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Directories under watch, persisted across restarts.
///
/// Adding a folder imports everything already in it before the watch is
/// attached. The full set is written to settings before a change is applied
/// in memory, so a failed save leaves the registry as it was.
pub struct WatchedFolders<W: WatchBackend> {
    folders: BTreeSet<PathBuf>,
    watcher: W,
    settings: SettingsStore,
    import: ImportHandle,
}

impl<W: WatchBackend> WatchedFolders<W> {
    pub fn new(watcher: W, settings: SettingsStore, import: ImportHandle) -> Self {
        Self {
            folders: BTreeSet::new(),
            watcher,
            settings,
            import,
        }
    }

    /// Start watching `path`, importing the audio files it already holds.
    pub async fn add(&mut self, path: &Path) -> Result<BatchStatistics, RegistryError> {
        let (root, stats) = self.attach(path).await?;

        let mut updated = self.folders.clone();
        updated.insert(root.clone());
        if let Err(e) = self.persist(&updated) {
            if let Err(unwatch) = self.watcher.unwatch(&root) {
                warn!("Failed to detach watch on {}: {}", root.display(), unwatch);
            }
            return Err(e);
        }

        self.folders = updated;
        Ok(stats)
    }

    /// Stop watching `path`. Returns `false` if it was never watched.
    pub fn remove(&mut self, path: &Path) -> Result<bool, RegistryError> {
        let root = normalize_path(path);

        if !self.folders.contains(&root) {
            debug!("Not watched, nothing to remove: {}", root.display());
            return Ok(false);
        }

        let mut updated = self.folders.clone();
        updated.remove(&root);
        self.persist(&updated)?;
        self.folders = updated;

        if let Err(e) = self.watcher.unwatch(&root) {
            warn!("Failed to detach watch on {}: {}", root.display(), e);
        }

        info!("Stopped watching folder: {}", root.display());
        Ok(true)
    }

    pub fn list(&self) -> Vec<PathBuf> {
        self.folders.iter().cloned().collect()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.folders.contains(&normalize_path(path))
    }

    /// Re-attach the folders saved by a previous run.
    ///
    /// Saved folders that no longer exist are skipped but kept in settings, so
    /// a drive that is only temporarily unmounted comes back on a later start.
    pub async fn restore(&mut self) -> Result<Vec<PathBuf>, RegistryError> {
        let saved = self.settings.load_watched_paths()?;
        let mut restored = Vec::new();

        for path in &saved {
            let root = normalize_path(path);
            if !root.is_dir() {
                warn!("Skipping missing watched folder: {}", root.display());
                continue;
            }

            match self.attach(&root).await {
                Ok((root, stats)) => {
                    debug!(
                        "Restored {}: {} new, {} known",
                        root.display(),
                        stats.added,
                        stats.duplicates
                    );
                    self.folders.insert(root.clone());
                    restored.push(root);
                }
                Err(RegistryError::AlreadyWatched(_)) => {}
                Err(e) => warn!("Failed to restore {}: {}", root.display(), e),
            }
        }

        info!("Restored {} of {} watched folder(s)", restored.len(), saved.len());
        Ok(restored)
    }

    /// Validate, scan, import and watch a folder without registering it
    async fn attach(&mut self, path: &Path) -> Result<(PathBuf, BatchStatistics), RegistryError> {
        let root = normalize_path(path);

        if self.folders.contains(&root) {
            return Err(RegistryError::AlreadyWatched(root));
        }
        if !root.exists() {
            return Err(RegistryError::DirectoryNotFound(root));
        }
        if !root.is_dir() {
            return Err(RegistryError::NotADirectory(root));
        }

        let scan_root = root.clone();
        let report = tokio::task::spawn_blocking(move || scan_directory(&scan_root)).await??;

        for issue in &report.issues {
            warn!(
                "Skipped unreadable directory {}: {}",
                issue.directory.display(),
                issue.error
            );
        }

        let stats = self.import.import_batch(report.into_paths(), true).await?;
        self.watcher.watch(&root)?;

        info!(
            "Started watching folder: {} ({} added, {} duplicate(s), {} error(s))",
            root.display(),
            stats.added,
            stats.duplicates,
            stats.errors
        );
        Ok((root, stats))
    }

    fn persist(&self, folders: &BTreeSet<PathBuf>) -> Result<(), RegistryError> {
        let paths: Vec<PathBuf> = folders.iter().cloned().collect();
        self.settings.save_watched_paths(&paths)?;
        Ok(())
    }
}
