// Test support utilities for unit tests

use crate::import::{ExtractionError, SongImporter};
use crate::library::LibraryError;
use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// In-memory stand-in for the library.
///
/// Remembers imported paths so a second import reports a duplicate, and fails
/// any path containing "corrupt" the way a bad tag read would.
#[derive(Default)]
pub struct MemoryImporter {
    imported: Mutex<HashSet<PathBuf>>,
    calls: Mutex<Vec<PathBuf>>,
    cancel_on: Mutex<Option<(PathBuf, CancellationToken)>>,
}

impl MemoryImporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel `token` when `path` is imported
    pub fn cancel_on(&self, path: PathBuf, token: CancellationToken) {
        *self.cancel_on.lock().unwrap() = Some((path, token));
    }

    /// Every path passed to `import_song`, in call order
    pub fn calls(&self) -> Vec<PathBuf> {
        self.calls.lock().unwrap().clone()
    }

    pub fn imported(&self) -> HashSet<PathBuf> {
        self.imported.lock().unwrap().clone()
    }
}

#[async_trait]
impl SongImporter for MemoryImporter {
    async fn import_song(&self, path: &Path) -> Result<(), LibraryError> {
        self.calls.lock().unwrap().push(path.to_path_buf());

        if let Some((trigger, token)) = self.cancel_on.lock().unwrap().as_ref() {
            if trigger == path {
                token.cancel();
            }
        }

        if path.to_string_lossy().contains("corrupt") {
            return Err(LibraryError::Extraction(ExtractionError::Probe(
                "unsupported stream".to_string(),
            )));
        }

        if !self.imported.lock().unwrap().insert(path.to_path_buf()) {
            return Err(LibraryError::Duplicate(path.to_path_buf()));
        }

        Ok(())
    }
}
