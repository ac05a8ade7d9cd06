//! Recursive folder scanner producing import candidates.
//!
//! Walks every nested directory of a root and collects regular files whose
//! extension is in the audio allow-list. A directory that cannot be read is
//! recorded as an issue and its siblings are still visited, so one bad
//! permission never hides the rest of a library.

use crate::import::types::ImportCandidate;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Directory does not exist: {0}")]
    DirectoryNotFound(PathBuf),
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
}

/// A directory that could not be read during a scan
#[derive(Debug)]
pub struct ScanIssue {
    pub directory: PathBuf,
    pub error: io::Error,
}

/// Everything a scan found
#[derive(Debug, Default)]
pub struct ScanReport {
    /// Audio files in traversal order
    pub candidates: Vec<ImportCandidate>,
    /// Directories that were skipped because they could not be read
    pub issues: Vec<ScanIssue>,
}

impl ScanReport {
    /// Paths of all candidates, consuming the report
    pub fn into_paths(self) -> Vec<PathBuf> {
        self.candidates.into_iter().map(|c| c.path).collect()
    }
}

/// Scan a folder tree for audio files.
///
/// Fails only when the root itself is missing or not a directory. Order of the
/// returned candidates follows the filesystem and is not stable across platforms.
pub fn scan_directory(root: &Path) -> Result<ScanReport, ScanError> {
    if !root.exists() {
        return Err(ScanError::DirectoryNotFound(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(ScanError::NotADirectory(root.to_path_buf()));
    }

    info!("Scanning for audio files in: {:?}", root);

    let mut report = ScanReport::default();
    scan_recursive(root, &mut report);

    info!(
        "Found {} audio file(s) in {:?} ({} unreadable director{})",
        report.candidates.len(),
        root,
        report.issues.len(),
        if report.issues.len() == 1 { "y" } else { "ies" }
    );

    Ok(report)
}

fn scan_recursive(dir: &Path, report: &mut ScanReport) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(error) => {
            warn!("Failed to read dir {:?}: {}", dir, error);
            report.issues.push(ScanIssue {
                directory: dir.to_path_buf(),
                error,
            });
            return;
        }
    };

    let mut subdirs = Vec::new();

    for entry in entries.flatten() {
        let path = entry.path();
        let file_type = match entry.file_type() {
            Ok(file_type) => file_type,
            Err(e) => {
                debug!("Skipping {:?}: {}", path, e);
                continue;
            }
        };

        if file_type.is_dir() {
            subdirs.push(path);
        } else if file_type.is_file() {
            if let Some(candidate) = ImportCandidate::from_path(path) {
                report.candidates.push(candidate);
            }
        } else if file_type.is_symlink() {
            // Follow links to files; never descend through linked directories
            match fs::metadata(&path) {
                Ok(meta) if meta.is_file() => {
                    if let Some(candidate) = ImportCandidate::from_path(path) {
                        report.candidates.push(candidate);
                    }
                }
                Ok(_) => debug!("Not following directory symlink {:?}", path),
                Err(e) => debug!("Dangling symlink {:?}: {}", path, e),
            }
        }
    }

    for subdir in subdirs {
        scan_recursive(&subdir, report);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"data").unwrap();
    }

    #[test]
    fn test_scan_collects_nested_audio_only() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("a.mp3"));
        touch(&dir.path().join("b.txt"));
        touch(&dir.path().join("sub/c.flac"));

        let report = scan_directory(dir.path()).unwrap();
        let found: HashSet<PathBuf> = report.into_paths().into_iter().collect();

        let expected: HashSet<PathBuf> = [dir.path().join("a.mp3"), dir.path().join("sub/c.flac")]
            .into_iter()
            .collect();
        assert_eq!(found, expected);
    }

    #[test]
    fn test_scan_matches_extensions_case_insensitively() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("LOUD.MP3"));
        touch(&dir.path().join("deep/er/still/Track.Ogg"));
        touch(&dir.path().join("cover.JPG"));

        let report = scan_directory(dir.path()).unwrap();
        assert_eq!(report.candidates.len(), 2);
        assert!(report.issues.is_empty());
    }

    #[test]
    fn test_scan_missing_root_is_directory_not_found() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("gone");

        match scan_directory(&missing) {
            Err(ScanError::DirectoryNotFound(path)) => assert_eq!(path, missing),
            other => panic!("expected DirectoryNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_scan_file_root_is_rejected() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("song.mp3");
        touch(&file);

        assert!(matches!(
            scan_directory(&file),
            Err(ScanError::NotADirectory(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_scan_does_not_follow_directory_symlinks() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("music/one.wav"));
        // Link pointing back at the root would loop forever if followed
        std::os::unix::fs::symlink(dir.path(), dir.path().join("music/loop")).unwrap();
        std::os::unix::fs::symlink(
            dir.path().join("music/one.wav"),
            dir.path().join("linked.wav"),
        )
        .unwrap();

        let report = scan_directory(dir.path()).unwrap();
        let found: HashSet<PathBuf> = report.into_paths().into_iter().collect();
        assert_eq!(found.len(), 2);
        assert!(found.contains(&dir.path().join("linked.wav")));
    }

    #[cfg(unix)]
    #[test]
    fn test_scan_continues_past_unreadable_directory() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("ok/good.flac"));
        touch(&dir.path().join("locked/hidden.flac"));

        let locked = dir.path().join("locked");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Root ignores permission bits; nothing to observe in that case
        if fs::read_dir(&locked).is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let report = scan_directory(dir.path()).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].directory, locked);
        assert_eq!(report.candidates.len(), 1);
        assert_eq!(report.candidates[0].path, dir.path().join("ok/good.flac"));
    }
}
