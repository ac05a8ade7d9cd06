// # Import Service
//
// Single worker task that owns all import work:
// - Watcher additions land in the ImportQueue and are drained after a settle window
// - Explicit batches (initial folder scans) go straight to the BulkImportPipeline
//
// Everything runs on one task, so a drain (including the pipeline hand-off) always
// finishes before the next one starts.

use crate::import::handle::ImportHandle;
use crate::import::pipeline::{BulkImportPipeline, SongImporter};
use crate::import::queue::{DrainRequest, ImportQueue};
use crate::import::types::{BatchStatistics, FileOutcome, ImportNotification};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Tuning for the import worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportConfig {
    /// Files imported between two progress reports
    pub sub_batch_size: usize,
    /// Settle window between the first queued path and the drain
    pub debounce: Duration,
    /// Pause after each sub-batch
    pub batch_yield: Duration,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            sub_batch_size: 10,
            debounce: Duration::from_millis(1000),
            batch_yield: Duration::from_millis(10),
        }
    }
}

/// Work accepted by the import worker
#[derive(Debug)]
pub enum ImportRequest {
    /// A new audio file reported by a folder watcher
    FileAdded(PathBuf),
    /// A known set of files, imported as one batch
    Batch {
        paths: Vec<PathBuf>,
        is_initial_scan: bool,
        reply: oneshot::Sender<BatchStatistics>,
    },
}

/// Import worker running on the shared runtime
pub struct ImportService {
    pipeline: BulkImportPipeline,
    queue: ImportQueue,
    request_rx: mpsc::UnboundedReceiver<ImportRequest>,
    notifications_tx: mpsc::UnboundedSender<ImportNotification>,
    shutdown: CancellationToken,
    debounce: Duration,
}

impl ImportService {
    /// Start import service worker, returning handle for sending requests
    pub fn start(
        runtime_handle: tokio::runtime::Handle,
        importer: Arc<dyn SongImporter>,
        config: ImportConfig,
    ) -> ImportHandle {
        let (requests_tx, request_rx) = mpsc::unbounded_channel();
        let (notifications_tx, notifications_rx) = mpsc::unbounded_channel();
        let shutdown = CancellationToken::new();

        let pipeline = BulkImportPipeline::new(
            importer,
            &config,
            notifications_tx.clone(),
            shutdown.clone(),
        );

        let service = ImportService {
            pipeline,
            queue: ImportQueue::new(),
            request_rx,
            notifications_tx,
            shutdown: shutdown.clone(),
            debounce: config.debounce,
        };

        // Spawn import worker task on shared runtime
        runtime_handle.spawn(service.run());

        ImportHandle::new(requests_tx, notifications_rx, shutdown, runtime_handle)
    }

    async fn run(mut self) {
        info!("Import worker started");

        let mut drain_at: Option<Instant> = None;

        loop {
            tokio::select! {
                biased;

                _ = self.shutdown.cancelled() => {
                    info!("Shutdown requested, {} queued path(s) dropped", self.queue.len());
                    break;
                }

                request = self.request_rx.recv() => {
                    let Some(request) = request else {
                        info!("Request channel closed");
                        break;
                    };
                    if self.handle_request(request).await == DrainRequest::Schedule {
                        drain_at = Some(Instant::now() + self.debounce);
                    }
                }

                _ = sleep_until(drain_at.unwrap_or_else(Instant::now)), if drain_at.is_some() => {
                    drain_at = None;
                    if self.drain().await == DrainRequest::Schedule {
                        drain_at = Some(Instant::now() + self.debounce);
                    }
                }
            }
        }

        info!("Import worker stopped");
    }

    async fn handle_request(&mut self, request: ImportRequest) -> DrainRequest {
        match request {
            ImportRequest::FileAdded(path) => {
                debug!("Queued {:?}", path);
                self.queue.enqueue(path)
            }
            ImportRequest::Batch {
                paths,
                is_initial_scan,
                reply,
            } => {
                let stats = self.pipeline.run(&paths, is_initial_scan).await;
                let _ = reply.send(stats);
                DrainRequest::AlreadyPending
            }
        }
    }

    /// Process one snapshot of the queue.
    ///
    /// Returns `Schedule` when paths arrived while the snapshot was processed.
    async fn drain(&mut self) -> DrainRequest {
        let Some(paths) = self.queue.begin_drain() else {
            return DrainRequest::AlreadyPending;
        };

        match paths.len() {
            0 => {}
            1 => self.import_single(paths[0].clone()).await,
            _ => {
                let stats = self.pipeline.run(&paths, false).await;
                if stats.added > 0 && !self.shutdown.is_cancelled() {
                    let _ = self
                        .notifications_tx
                        .send(ImportNotification::SongsBatchAdded { paths });
                }
            }
        }

        // Watcher events that arrived mid-drain belong to the next cycle
        let mut deferred_batches = Vec::new();
        while let Ok(request) = self.request_rx.try_recv() {
            match request {
                ImportRequest::FileAdded(path) => {
                    let _ = self.queue.enqueue(path);
                }
                batch @ ImportRequest::Batch { .. } => deferred_batches.push(batch),
            }
        }

        let next = self.queue.finish_drain();
        if next == DrainRequest::Schedule {
            debug!("{} path(s) arrived during drain", self.queue.len());
        }

        for batch in deferred_batches {
            let _ = self.handle_request(batch).await;
        }

        next
    }

    async fn import_single(&mut self, path: PathBuf) {
        match self.pipeline.import_one(&path).await {
            FileOutcome::Added => {
                info!("Added {:?}", path);
                if !self.shutdown.is_cancelled() {
                    let _ = self
                        .notifications_tx
                        .send(ImportNotification::single_file_added(path));
                }
            }
            FileOutcome::Duplicate => debug!("Already in library: {:?}", path),
            FileOutcome::Failed(e) => warn!("Failed to add {:?}: {}", path, e),
        }
    }
}
