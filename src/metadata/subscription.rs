use std::future::Future;
use tokio::sync::{mpsc, watch};
use tracing::debug;

use super::{MetadataError, PhotoRecord};

pub type Snapshot = Result<Vec<PhotoRecord>, MetadataError>;

const SNAPSHOT_BUFFER: usize = 4;

/// Live query: yields the full result set once immediately and again after
/// every change to the watched collection. Dropping it unsubscribes.
pub struct Subscription {
    rx: mpsc::Receiver<Snapshot>,
}

impl Subscription {
    /// Next snapshot. An `Err` is terminal; `None` means the feed has ended.
    pub async fn next(&mut self) -> Option<Snapshot> {
        self.rx.recv().await
    }

    /// Stops the feed. Snapshots already buffered are still returned by `next`.
    pub fn cancel(&mut self) {
        self.rx.close();
    }

    /// Spawns the feed task driving a subscription. `fetch` runs once per
    /// observed revision of `changes`; rapid changes coalesce into one snapshot.
    pub(crate) fn spawn<F, Fut>(mut changes: watch::Receiver<u64>, fetch: F) -> Self
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = Snapshot> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(SNAPSHOT_BUFFER);

        tokio::spawn(async move {
            loop {
                changes.borrow_and_update();
                let snapshot = fetch().await;
                let failed = snapshot.is_err();

                if tx.send(snapshot).await.is_err() || failed {
                    break;
                }

                tokio::select! {
                    _ = tx.closed() => break,
                    changed = changes.changed() => {
                        if changed.is_err() {
                            let _ = tx.send(Err(MetadataError::SubscriptionClosed)).await;
                            break;
                        }
                    }
                }
            }
            debug!("Subscription feed stopped");
        });

        Self { rx }
    }
}
