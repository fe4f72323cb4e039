//! Feed change watcher.
//!
//! Listens for the collaborator's content-changed signal and rebroadcasts
//! the fresh eligibility count. This replaces retry-after-timeout polling;
//! the executor itself contains no timing loops besides pacing.

use std::sync::Arc;

use tokio::sync::{broadcast, Notify};
use tracing::debug;

use ovation_core::events::EngineEvent;
use ovation_core::types::Timestamp;

use crate::discovery::FeedDiscovery;

/// Background watcher that refreshes the eligibility count on feed changes.
pub struct FeedWatcher {
    feed: Arc<dyn FeedDiscovery>,
    changed: Arc<Notify>,
    event_tx: broadcast::Sender<EngineEvent>,
    shutdown: Arc<Notify>,
}

impl FeedWatcher {
    /// Create a watcher for the given feed and its change signal.
    pub fn new(
        feed: Arc<dyn FeedDiscovery>,
        changed: Arc<Notify>,
        event_tx: broadcast::Sender<EngineEvent>,
    ) -> Self {
        Self {
            feed,
            changed,
            event_tx,
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// Run the watcher loop. Returns on shutdown signal.
    pub async fn run(&self) {
        loop {
            tokio::select! {
                _ = self.changed.notified() => {
                    match self.feed.list_eligible().await {
                        Ok(targets) => {
                            let _ = self.event_tx.send(EngineEvent::EligibilityChanged {
                                eligible: targets.len() as u64,
                                timestamp: Timestamp::now(),
                            });
                        }
                        Err(e) => debug!(error = %e, "Eligibility refresh failed"),
                    }
                }
                _ = self.shutdown.notified() => {
                    return; // Graceful shutdown
                }
            }
        }
    }

    /// Signal the watcher to shut down gracefully.
    pub fn shutdown(&self) {
        self.shutdown.notify_one();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::{KudoTarget, MemoryFeed};

    #[tokio::test]
    async fn test_watcher_shutdown() {
        let feed = Arc::new(MemoryFeed::new());
        let changed = feed.changed();
        let (event_tx, _) = broadcast::channel(16);
        let watcher = FeedWatcher::new(feed, changed, event_tx);

        watcher.shutdown();

        tokio::time::timeout(std::time::Duration::from_secs(2), watcher.run())
            .await
            .expect("Watcher should shut down within timeout");
    }

    #[tokio::test]
    async fn test_watcher_emits_on_change() {
        let feed = Arc::new(MemoryFeed::new());
        let changed = feed.changed();
        let (event_tx, mut events) = broadcast::channel(16);
        let watcher = Arc::new(FeedWatcher::new(
            Arc::clone(&feed) as Arc<dyn FeedDiscovery>,
            changed,
            event_tx,
        ));

        let runner = Arc::clone(&watcher);
        let task = tokio::spawn(async move { runner.run().await });

        feed.seed(vec![KudoTarget::new("a"), KudoTarget::new("b")]);

        let event = tokio::time::timeout(std::time::Duration::from_secs(2), events.recv())
            .await
            .expect("no event within timeout")
            .unwrap();
        match event {
            EngineEvent::EligibilityChanged { eligible, .. } => assert_eq!(eligible, 2),
            other => panic!("unexpected event: {}", other.event_name()),
        }

        watcher.shutdown();
        task.await.unwrap();
    }
}
