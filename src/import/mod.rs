// # Import Module
//
// Folder import with focused, testable components:
//
// - **FolderScanner**: Recursively discovers audio files under a directory
// - **Metadata**: Extracts tags, duration and cover art from a file
// - **ImportQueue**: Coalesces watcher additions into drains
// - **Pipeline**: Imports a batch in sub-batches with progress reporting
// - **ImportService**: Single worker that owns queue draining and batches
//
// Public API:
// - `ImportService`: Create and start the service
// - `ImportHandle`: Send requests and subscribe to notifications
// - `ImportNotification`: Batch progress and song-added events

mod folder_scanner;
mod handle;
mod metadata;
mod pipeline;
mod progress;
mod queue;
mod service;
mod types;

// Public API exports
pub use folder_scanner::{scan_directory, ScanError, ScanIssue, ScanReport};
pub use handle::{ImportError, ImportHandle};
pub use metadata::{
    AudioMetadata, CoverImage, ExtractionError, MetadataExtractor, SymphoniaExtractor,
};
pub use pipeline::{BulkImportPipeline, SongImporter};
pub use progress::NotificationFilter;
pub use queue::{DrainRequest, ImportQueue, QueueState};
pub use service::{ImportConfig, ImportService};
pub use types::{
    is_audio_file, AudioFormat, BatchStatistics, FileOutcome, ImportCandidate, ImportNotification,
};
