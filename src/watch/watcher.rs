//! Native change notifications for watched folders.

use crate::import::{is_audio_file, scan_directory, ImportHandle};
use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error, info, warn};

#[derive(Error, Debug)]
pub enum WatcherError {
    #[error("Notify error: {0}")]
    Notify(#[from] notify::Error),
    #[error("Not watched: {0}")]
    NotWatched(PathBuf),
}

/// What a raw filesystem event means for the library
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchSignal {
    Added(PathBuf),
    /// A directory appeared; files already inside it get no events of their own
    DirectoryAdded(PathBuf),
    Removed(PathBuf),
}

/// Attaches and detaches recursive watches on directories
pub trait WatchBackend: Send {
    fn watch(&mut self, root: &Path) -> Result<(), WatcherError>;
    fn unwatch(&mut self, root: &Path) -> Result<(), WatcherError>;
}

/// Watches folders with the platform's native backend and queues new audio
/// files on the import worker.
pub struct FolderWatcher {
    import: ImportHandle,
    watchers: HashMap<PathBuf, RecommendedWatcher>,
}

impl FolderWatcher {
    pub fn new(import: ImportHandle) -> Self {
        Self {
            import,
            watchers: HashMap::new(),
        }
    }

    fn handle_event(root: &Path, import: &ImportHandle, result: notify::Result<Event>) {
        let event = match result {
            Ok(event) => event,
            Err(e) => {
                // Keep watching; only this event is lost
                error!("Watcher error under {}: {}", root.display(), e);
                return;
            }
        };

        for signal in classify(root, &event) {
            match signal {
                WatchSignal::Added(path) => {
                    debug!("New file: {}", path.display());
                    if let Err(e) = import.enqueue(path) {
                        warn!("Dropping watcher event: {}", e);
                    }
                }
                WatchSignal::DirectoryAdded(dir) => {
                    debug!("New directory: {}", dir.display());
                    for path in files_in_added_directory(root, &dir) {
                        if let Err(e) = import.enqueue(path) {
                            warn!("Dropping watcher event: {}", e);
                            break;
                        }
                    }
                }
                // Songs stay in the library when their file disappears
                WatchSignal::Removed(path) => info!("File removed: {}", path.display()),
            }
        }
    }
}

impl WatchBackend for FolderWatcher {
    fn watch(&mut self, root: &Path) -> Result<(), WatcherError> {
        let import = self.import.clone();
        let event_root = root.to_path_buf();

        let mut watcher = notify::recommended_watcher(move |result: notify::Result<Event>| {
            Self::handle_event(&event_root, &import, result)
        })?;
        watcher.watch(root, RecursiveMode::Recursive)?;

        self.watchers.insert(root.to_path_buf(), watcher);
        info!("Watching {}", root.display());
        Ok(())
    }

    fn unwatch(&mut self, root: &Path) -> Result<(), WatcherError> {
        // Dropping the watcher stops its event thread
        let mut watcher = self
            .watchers
            .remove(root)
            .ok_or_else(|| WatcherError::NotWatched(root.to_path_buf()))?;
        watcher.unwatch(root)?;

        info!("Stopped watching {}", root.display());
        Ok(())
    }
}

/// Translate a raw event under `root` into library signals.
///
/// Hidden entries below the root and files outside the audio allow-list are
/// dropped. A rename into the tree counts as an addition; a directory that
/// appears is reported as such so its contents can be scanned.
pub fn classify(root: &Path, event: &Event) -> Vec<WatchSignal> {
    let added = |paths: &[PathBuf]| -> Vec<WatchSignal> {
        paths.iter().cloned().map(WatchSignal::Added).collect()
    };
    let removed = |paths: &[PathBuf]| -> Vec<WatchSignal> {
        paths.iter().cloned().map(WatchSignal::Removed).collect()
    };

    let signals = match &event.kind {
        EventKind::Create(_) => added(&event.paths),
        EventKind::Remove(_) => removed(&event.paths),
        EventKind::Modify(ModifyKind::Name(mode)) => match mode {
            RenameMode::To => added(&event.paths),
            RenameMode::From => removed(&event.paths),
            // The destination also arrives as a separate `To` event
            RenameMode::Both => match event.paths.as_slice() {
                [from, _] => vec![WatchSignal::Removed(from.clone())],
                _ => Vec::new(),
            },
            // Backends that cannot tell the two sides apart
            _ => event
                .paths
                .iter()
                .map(|p| {
                    if p.exists() {
                        WatchSignal::Added(p.clone())
                    } else {
                        WatchSignal::Removed(p.clone())
                    }
                })
                .collect(),
        },
        _ => Vec::new(),
    };

    signals
        .into_iter()
        .map(|signal| match signal {
            WatchSignal::Added(p) if p.is_dir() => WatchSignal::DirectoryAdded(p),
            other => other,
        })
        .filter(|signal| match signal {
            WatchSignal::DirectoryAdded(p) => p != root && !is_hidden(root, p),
            WatchSignal::Added(p) | WatchSignal::Removed(p) => {
                is_audio_file(p) && !is_hidden(root, p)
            }
        })
        .collect()
}

/// Audio files already inside a directory that just appeared under `root`.
///
/// Runs on the watcher's event thread, so the blocking scan is fine here.
pub fn files_in_added_directory(root: &Path, dir: &Path) -> Vec<PathBuf> {
    match scan_directory(dir) {
        Ok(report) => report
            .into_paths()
            .into_iter()
            .filter(|path| !is_hidden(root, path))
            .collect(),
        Err(e) => {
            // Moved away again before we got to it
            debug!("Skipping vanished directory {}: {}", dir.display(), e);
            Vec::new()
        }
    }
}

fn is_hidden(root: &Path, path: &Path) -> bool {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative.components().any(|component| match component {
        Component::Normal(name) => name.to_string_lossy().starts_with('.'),
        _ => false,
    })
}
