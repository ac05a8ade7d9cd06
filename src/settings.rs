//! Durable settings: the list of watched folders.
//!
//! Stored as a small JSON document. Every write replaces the whole file so a
//! reader never sees a partially updated list.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

const SETTINGS_VERSION: &str = "1.0.0";

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
struct Settings {
    #[serde(default)]
    watched_folders: Vec<PathBuf>,
    #[serde(default)]
    version: String,
}

/// JSON file holding the watched folder list
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        SettingsStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted watched folders. A missing file is an empty list.
    pub fn load_watched_paths(&self) -> Result<Vec<PathBuf>, SettingsError> {
        Ok(self.load()?.watched_folders)
    }

    /// Replace the persisted watched folders with `paths`
    pub fn save_watched_paths(&self, paths: &[PathBuf]) -> Result<(), SettingsError> {
        let mut settings = self.load().unwrap_or_else(|e| {
            warn!("Replacing unreadable settings at {:?}: {}", self.path, e);
            Settings::default()
        });
        settings.watched_folders = paths.to_vec();
        settings.version = SETTINGS_VERSION.to_string();

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Write to a sibling then rename over the old file
        let json = serde_json::to_string_pretty(&settings)?;
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, json)?;
        fs::rename(&tmp_path, &self.path)?;

        debug!(
            "Saved {} watched folder(s) to {:?}",
            settings.watched_folders.len(),
            self.path
        );
        Ok(())
    }

    fn load(&self) -> Result<Settings, SettingsError> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("No settings file at {:?}, starting empty", self.path);
                Ok(Settings::default())
            }
            Err(e) => Err(e.into()),
        }
    }
}
