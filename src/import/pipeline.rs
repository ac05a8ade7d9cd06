// # Bulk Import Pipeline
//
// Drives extraction and persistence for a batch of paths:
//
// 1. Announce the batch (BatchStarted)
// 2. Split into fixed-size sub-batches, preserving input order
// 3. Import each file of a sub-batch sequentially, folding every FileOutcome into
//    the batch statistics
// 4. After each sub-batch: report cumulative progress, then yield briefly
// 5. Announce completion (BatchComplete) and return the statistics
//
// A failing file only bumps the error counter; nothing aborts the batch.

use crate::import::service::ImportConfig;
use crate::import::types::{BatchStatistics, FileOutcome, ImportNotification};
use crate::library::LibraryError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Extraction-and-insert step for one file.
///
/// `Err(LibraryError::Duplicate)` means the path is already in the library;
/// any other error is a failed import of that file.
#[async_trait]
pub trait SongImporter: Send + Sync {
    async fn import_song(&self, path: &Path) -> Result<(), LibraryError>;
}

pub struct BulkImportPipeline {
    importer: Arc<dyn SongImporter>,
    sub_batch_size: usize,
    batch_yield: Duration,
    notifications_tx: mpsc::UnboundedSender<ImportNotification>,
    shutdown: CancellationToken,
    stats: BatchStatistics,
}

impl BulkImportPipeline {
    pub fn new(
        importer: Arc<dyn SongImporter>,
        config: &ImportConfig,
        notifications_tx: mpsc::UnboundedSender<ImportNotification>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            importer,
            sub_batch_size: config.sub_batch_size.max(1),
            batch_yield: config.batch_yield,
            notifications_tx,
            shutdown,
            stats: BatchStatistics::default(),
        }
    }

    /// Statistics of the current (or last) batch
    pub fn statistics(&self) -> BatchStatistics {
        self.stats
    }

    /// Import a single file, converting the result into a tagged outcome
    pub async fn import_one(&self, path: &Path) -> FileOutcome {
        match self.importer.import_song(path).await {
            Ok(()) => FileOutcome::Added,
            Err(LibraryError::Duplicate(_)) => {
                debug!("Duplicate: {:?}", path);
                FileOutcome::Duplicate
            }
            Err(e) => {
                warn!("Error processing {:?}: {}", path, e);
                FileOutcome::Failed(e.to_string())
            }
        }
    }

    /// Import a batch of paths.
    ///
    /// `is_initial_scan` only changes how the batch is announced. If shutdown
    /// begins mid-batch, the running sub-batch finishes and the rest is abandoned
    /// without further notifications.
    pub async fn run(&mut self, paths: &[PathBuf], is_initial_scan: bool) -> BatchStatistics {
        self.stats = BatchStatistics::default();

        if paths.is_empty() || self.shutdown.is_cancelled() {
            return self.stats;
        }

        self.stats = BatchStatistics::new(paths.len());
        let total_sub_batches = paths.len().div_ceil(self.sub_batch_size);

        info!(
            "Starting {} of {} file(s) in {} sub-batch(es)",
            if is_initial_scan {
                "initial scan import"
            } else {
                "bulk import"
            },
            paths.len(),
            total_sub_batches
        );

        self.emit(ImportNotification::BatchStarted {
            total: paths.len(),
            is_initial_scan,
        });

        for (index, sub_batch) in paths.chunks(self.sub_batch_size).enumerate() {
            for path in sub_batch {
                let outcome = self.import_one(path).await;
                self.stats.record(&outcome);
            }

            if self.shutdown.is_cancelled() {
                info!(
                    "Shutdown requested, abandoning batch after sub-batch {}/{} ({} of {} processed)",
                    index + 1,
                    total_sub_batches,
                    self.stats.processed(),
                    self.stats.total
                );
                return self.stats;
            }

            debug!(
                "Sub-batch {}/{} done: {}/{} processed",
                index + 1,
                total_sub_batches,
                self.stats.processed(),
                self.stats.total
            );
            self.emit(ImportNotification::progress(&self.stats));

            // Let the host breathe between sub-batches
            tokio::time::sleep(self.batch_yield).await;
        }

        info!(
            "Batch complete: {} added, {} duplicate(s), {} error(s) of {}",
            self.stats.added, self.stats.duplicates, self.stats.errors, self.stats.total
        );
        self.emit(ImportNotification::complete(&self.stats));

        self.stats
    }

    fn emit(&self, notification: ImportNotification) {
        let _ = self.notifications_tx.send(notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MemoryImporter;

    fn paths(count: usize) -> Vec<PathBuf> {
        (0..count)
            .map(|i| PathBuf::from(format!("/music/track{:02}.mp3", i)))
            .collect()
    }

    fn pipeline(
        importer: Arc<dyn SongImporter>,
    ) -> (
        BulkImportPipeline,
        mpsc::UnboundedReceiver<ImportNotification>,
        CancellationToken,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        let token = CancellationToken::new();
        let pipeline = BulkImportPipeline::new(importer, &ImportConfig::default(), tx, token.clone());
        (pipeline, rx, token)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<ImportNotification>) -> Vec<ImportNotification> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_empty_batch_is_noop() {
        let importer = Arc::new(MemoryImporter::new());
        let (mut pipeline, mut rx, _) = pipeline(importer.clone());

        let stats = pipeline.run(&[], true).await;

        assert_eq!(stats, BatchStatistics::default());
        assert!(drain(&mut rx).is_empty());
        assert!(importer.calls().is_empty());
    }

    #[tokio::test]
    async fn test_batch_emits_started_progress_complete() {
        let importer = Arc::new(MemoryImporter::new());
        let (mut pipeline, mut rx, _) = pipeline(importer);

        let stats = pipeline.run(&paths(25), true).await;
        assert_eq!(stats.added, 25);
        assert_eq!(stats.total, 25);

        let events = drain(&mut rx);
        assert_eq!(events.len(), 5);
        assert_eq!(
            events[0],
            ImportNotification::BatchStarted {
                total: 25,
                is_initial_scan: true
            }
        );

        let processed: Vec<usize> = events[1..4]
            .iter()
            .map(|e| match e {
                ImportNotification::BatchProgress { processed, total, .. } => {
                    assert_eq!(*total, 25);
                    *processed
                }
                other => panic!("expected progress, got {:?}", other),
            })
            .collect();
        assert_eq!(processed, vec![10, 20, 25]);

        assert_eq!(
            events[4],
            ImportNotification::BatchComplete {
                added: 25,
                duplicates: 0,
                errors: 0,
                total: 25
            }
        );
    }

    #[tokio::test]
    async fn test_rerun_reports_duplicates() {
        let importer = Arc::new(MemoryImporter::new());
        let (mut pipeline, _rx, _) = pipeline(importer);
        let batch = paths(12);

        let first = pipeline.run(&batch, false).await;
        let second = pipeline.run(&batch, false).await;

        assert_eq!(first.added, 12);
        assert_eq!(second.added, 0);
        assert_eq!(second.duplicates, 12);
        assert_eq!(second.errors, 0);
    }

    #[tokio::test]
    async fn test_failed_file_does_not_abort_batch() {
        let importer = Arc::new(MemoryImporter::new());
        let (mut pipeline, _rx, _) = pipeline(importer.clone());
        let mut batch = paths(6);
        batch.insert(2, PathBuf::from("/music/corrupt.flac"));

        let stats = pipeline.run(&batch, false).await;

        assert_eq!(stats.errors, 1);
        assert_eq!(stats.added, 6);
        assert_eq!(importer.imported().len(), 6);
    }

    #[tokio::test]
    async fn test_files_processed_in_input_order() {
        let importer = Arc::new(MemoryImporter::new());
        let (mut pipeline, _rx, _) = pipeline(importer.clone());
        let mut batch = paths(15);
        batch.reverse();

        pipeline.run(&batch, false).await;

        assert_eq!(importer.calls(), batch);
    }

    #[tokio::test]
    async fn test_statistics_reset_between_batches() {
        let importer = Arc::new(MemoryImporter::new());
        let (mut pipeline, _rx, _) = pipeline(importer);

        pipeline.run(&paths(3), false).await;
        pipeline.run(&[PathBuf::from("/music/new.ogg")], false).await;

        assert_eq!(
            pipeline.statistics(),
            BatchStatistics {
                added: 1,
                duplicates: 0,
                errors: 0,
                total: 1
            }
        );
    }

    #[tokio::test]
    async fn test_shutdown_abandons_after_running_sub_batch() {
        let importer = Arc::new(MemoryImporter::new());
        let (mut pipeline, mut rx, token) = pipeline(importer.clone());
        importer.cancel_on(PathBuf::from("/music/track04.mp3"), token);

        let stats = pipeline.run(&paths(30), false).await;

        // The sub-batch holding track04 still completes
        assert_eq!(stats.processed(), 10);
        assert_eq!(importer.calls().len(), 10);

        let events = drain(&mut rx);
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], ImportNotification::BatchStarted { .. }));
    }
}
