mod manager;

pub use manager::{LibraryError, LibraryManager, SharedLibraryManager};
