//! Lexical path normalization shared by the library and the watched-folder registry.

use std::path::{Component, Path, PathBuf};

/// Normalize a path without touching the filesystem.
///
/// Relative paths are resolved against the current directory, `.` components are
/// dropped and `..` components pop their parent. Symlinks are left as-is, so two
/// spellings of the same file only compare equal after normalization when they
/// differ lexically.
pub fn normalize_path(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(path),
            Err(_) => path.to_path_buf(),
        }
    };

    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }

    normalized
}
