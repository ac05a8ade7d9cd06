// # Import Handle
//
// Handle for sending import requests and subscribing to notifications.
// Provides the public API for interacting with the import service.

use crate::import::progress::{ImportNotifications, NotificationFilter};
use crate::import::service::ImportRequest;
use crate::import::types::{BatchStatistics, ImportNotification};
use std::path::PathBuf;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImportError {
    #[error("Import service is not running")]
    ServiceStopped,
}

/// Handle for sending import requests and subscribing to notifications
#[derive(Clone)]
pub struct ImportHandle {
    requests_tx: mpsc::UnboundedSender<ImportRequest>,
    notifications: ImportNotifications,
    shutdown: CancellationToken,
}

impl ImportHandle {
    /// Create a new ImportHandle with the given dependencies
    pub(crate) fn new(
        requests_tx: mpsc::UnboundedSender<ImportRequest>,
        notifications_rx: mpsc::UnboundedReceiver<ImportNotification>,
        shutdown: CancellationToken,
        runtime_handle: tokio::runtime::Handle,
    ) -> Self {
        let notifications = ImportNotifications::new(notifications_rx, runtime_handle);

        Self {
            requests_tx,
            notifications,
            shutdown,
        }
    }

    /// Queue a newly discovered file for the next drain
    pub fn enqueue(&self, path: PathBuf) -> Result<(), ImportError> {
        if self.shutdown.is_cancelled() {
            return Err(ImportError::ServiceStopped);
        }
        self.requests_tx
            .send(ImportRequest::FileAdded(path))
            .map_err(|_| ImportError::ServiceStopped)
    }

    /// Import `paths` as one batch and wait for its statistics.
    ///
    /// Batches are serialized with watcher drains on the import worker.
    pub async fn import_batch(
        &self,
        paths: Vec<PathBuf>,
        is_initial_scan: bool,
    ) -> Result<BatchStatistics, ImportError> {
        if self.shutdown.is_cancelled() {
            return Err(ImportError::ServiceStopped);
        }

        let (reply, reply_rx) = oneshot::channel();
        self.requests_tx
            .send(ImportRequest::Batch {
                paths,
                is_initial_scan,
                reply,
            })
            .map_err(|_| ImportError::ServiceStopped)?;

        reply_rx.await.map_err(|_| ImportError::ServiceStopped)
    }

    /// Subscribe to import notifications
    /// Subscription is automatically removed when receiver is dropped
    pub fn subscribe(
        &self,
        filter: NotificationFilter,
    ) -> mpsc::UnboundedReceiver<ImportNotification> {
        self.notifications.subscribe(filter)
    }

    /// Stop the import worker. Queued paths are dropped and no further
    /// notifications are sent.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}
