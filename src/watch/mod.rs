// # Folder Watching
//
// - **WatchedFolders**: the persisted set of watched directories
// - **FolderWatcher**: native notifications feeding the import queue

mod registry;
mod watcher;

pub use registry::{RegistryError, WatchedFolders};
pub use watcher::{classify, FolderWatcher, WatchBackend, WatchSignal, WatcherError};
