use crate::import::types::ImportNotification;
use std::collections::HashMap;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex,
};
use tokio::sync::mpsc as tokio_mpsc;
use tracing::info;

type SubscriptionId = u64;

/// Filter criteria for notification subscriptions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationFilter {
    /// Every notification
    All,
    /// Batch started/progress/complete and batch-added events
    Batches,
    /// Single-file additions from the watcher
    SingleFiles,
}

impl NotificationFilter {
    fn matches(&self, notification: &ImportNotification) -> bool {
        match self {
            NotificationFilter::All => true,
            NotificationFilter::Batches => notification.is_batch_event(),
            NotificationFilter::SingleFiles => !notification.is_batch_event(),
        }
    }
}

struct Subscription {
    filter: NotificationFilter,
    tx: tokio_mpsc::UnboundedSender<ImportNotification>,
}

/// Handle for subscribing to import notifications
#[derive(Clone)]
pub struct ImportNotifications {
    subscriptions: Arc<Mutex<HashMap<SubscriptionId, Subscription>>>,
    next_id: Arc<AtomicU64>,
}

impl ImportNotifications {
    /// Create a new notification handle and spawn background task to dispatch notifications
    pub fn new(
        mut notifications_rx: tokio_mpsc::UnboundedReceiver<ImportNotification>,
        runtime_handle: tokio::runtime::Handle,
    ) -> Self {
        let subscriptions: Arc<Mutex<HashMap<SubscriptionId, Subscription>>> =
            Arc::new(Mutex::new(HashMap::new()));
        let subscriptions_clone = subscriptions.clone();

        // Spawn async task to receive notifications and dispatch to subscribers
        runtime_handle.spawn(async move {
            while let Some(notification) = notifications_rx.recv().await {
                // Dispatch to all matching subscribers
                let mut subs = match subscriptions_clone.lock() {
                    Ok(subs) => subs,
                    Err(poisoned) => poisoned.into_inner(),
                };
                let mut to_remove = Vec::new();

                for (id, subscription) in subs.iter() {
                    if subscription.filter.matches(&notification) {
                        // If send fails, receiver was dropped - mark for removal
                        if subscription.tx.send(notification.clone()).is_err() {
                            to_remove.push(*id);
                        }
                    }
                }

                // Clean up dropped subscriptions
                for id in to_remove {
                    subs.remove(&id);
                }
            }

            // Close every subscriber's stream
            match subscriptions_clone.lock() {
                Ok(mut subs) => subs.clear(),
                Err(poisoned) => poisoned.into_inner().clear(),
            }
            info!("Notification channel closed, exiting");
        });

        Self {
            subscriptions,
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Subscribe to notifications matching `filter`
    /// Subscription is automatically removed when receiver is dropped
    pub fn subscribe(
        &self,
        filter: NotificationFilter,
    ) -> tokio_mpsc::UnboundedReceiver<ImportNotification> {
        let (tx, rx) = tokio_mpsc::unbounded_channel();
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);

        let subscription = Subscription { filter, tx };

        match self.subscriptions.lock() {
            Ok(mut subs) => subs.insert(id, subscription),
            Err(poisoned) => poisoned.into_inner().insert(id, subscription),
        };
        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[tokio::test]
    async fn test_filters_route_notifications() {
        let (tx, rx) = tokio_mpsc::unbounded_channel();
        let notifications = ImportNotifications::new(rx, tokio::runtime::Handle::current());

        let mut all = notifications.subscribe(NotificationFilter::All);
        let mut batches = notifications.subscribe(NotificationFilter::Batches);
        let mut singles = notifications.subscribe(NotificationFilter::SingleFiles);

        tx.send(ImportNotification::BatchStarted {
            total: 2,
            is_initial_scan: false,
        })
        .unwrap();
        tx.send(ImportNotification::single_file_added(PathBuf::from(
            "/music/one.mp3",
        )))
        .unwrap();

        assert!(matches!(
            all.recv().await,
            Some(ImportNotification::BatchStarted { .. })
        ));
        assert!(matches!(
            all.recv().await,
            Some(ImportNotification::SingleFileAdded { .. })
        ));
        assert!(matches!(
            batches.recv().await,
            Some(ImportNotification::BatchStarted { .. })
        ));
        assert!(matches!(
            singles.recv().await,
            Some(ImportNotification::SingleFileAdded { .. })
        ));

        // Closing the source ends every subscription
        drop(tx);
        assert!(batches.recv().await.is_none());
        assert!(singles.recv().await.is_none());
    }
}
