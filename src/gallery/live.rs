use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info, warn};

use super::lifecycle::GalleryManager;
use super::types::PhotoRecord;
use super::view::{self, GalleryPage, ResolvedMedia};

/// What the gallery view currently shows for one context.
#[derive(Debug, Clone)]
pub enum ViewState {
    Loading,
    Ready {
        revision: u64,
        records: Vec<PhotoRecord>,
        media: HashMap<String, ResolvedMedia>,
    },
    /// Terminal: live updates stopped and are not re-established.
    Failed { message: String },
}

impl ViewState {
    pub fn render(&self, editing: Option<&str>) -> Option<GalleryPage> {
        match self {
            ViewState::Ready { records, media, .. } => Some(view::render(records, media, editing)),
            _ => None,
        }
    }

    pub fn records(&self) -> &[PhotoRecord] {
        match self {
            ViewState::Ready { records, .. } => records,
            _ => &[],
        }
    }

    pub fn revision(&self) -> u64 {
        match self {
            ViewState::Ready { revision, .. } => *revision,
            _ => 0,
        }
    }
}

/// Owns the subscription of one gallery context and the view state derived
/// from it. Every snapshot replaces the record list; URLs are filled in row by
/// row as they resolve.
pub struct LiveGallery {
    state: watch::Receiver<Arc<ViewState>>,
    task: JoinHandle<()>,
}

impl LiveGallery {
    pub fn start(manager: Arc<GalleryManager>) -> Self {
        let (tx, rx) = watch::channel(Arc::new(ViewState::Loading));
        let task = tokio::spawn(run_feed(manager, tx));
        Self { state: rx, task }
    }

    pub fn current(&self) -> Arc<ViewState> {
        self.state.borrow().clone()
    }

    /// Record as of the latest snapshot, without re-reading the store.
    pub fn find_record(&self, id: &str) -> Option<PhotoRecord> {
        self.current().records().iter().find(|r| r.id == id).cloned()
    }

    /// Waits until the view state satisfies `predicate`.
    pub async fn wait_until(&self, mut predicate: impl FnMut(&ViewState) -> bool) -> Arc<ViewState> {
        let mut rx = self.state.clone();
        match rx.wait_for(|state| predicate(state.as_ref())).await {
            Ok(state) => Arc::clone(&state),
            Err(_) => self.current(),
        }
    }

    /// Unsubscribes. The view keeps its last state.
    pub fn shutdown(&self) {
        self.task.abort();
    }
}

impl Drop for LiveGallery {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run_feed(manager: Arc<GalleryManager>, tx: watch::Sender<Arc<ViewState>>) {
    let context = manager.context().to_string();

    let mut subscription = match manager.subscribe().await {
        Ok(subscription) => subscription,
        Err(e) => {
            error!("[{}] Could not subscribe to gallery: {}", context, e);
            tx.send_replace(Arc::new(ViewState::Failed {
                message: e.to_string(),
            }));
            return;
        }
    };
    info!("[{}] Live gallery subscribed", context);

    let mut revision = 0u64;
    let mut resolving: JoinSet<(String, ResolvedMedia)> = JoinSet::new();

    loop {
        tokio::select! {
            snapshot = subscription.next() => match snapshot {
                Some(Ok(records)) => {
                    revision += 1;
                    debug!("[{}] Snapshot {} with {} records", context, revision, records.len());
                    // Replacing the set aborts lookups for the previous snapshot.
                    resolving = view::spawn_resolution(manager.objects(), &records);
                    tx.send_replace(Arc::new(ViewState::Ready {
                        revision,
                        records,
                        media: HashMap::new(),
                    }));
                }
                Some(Err(e)) => {
                    error!("[{}] Gallery subscription failed: {}", context, e);
                    tx.send_replace(Arc::new(ViewState::Failed {
                        message: format!("Live updates stopped ({}). Reload to try again.", e),
                    }));
                    return;
                }
                None => {
                    warn!("[{}] Gallery subscription ended", context);
                    tx.send_replace(Arc::new(ViewState::Failed {
                        message: "Live updates ended. Reload to try again.".to_string(),
                    }));
                    return;
                }
            },
            Some(joined) = resolving.join_next(), if !resolving.is_empty() => match joined {
                Ok((id, media)) => {
                    tx.send_modify(|state| {
                        if let ViewState::Ready { media: resolved, .. } = Arc::make_mut(state) {
                            resolved.insert(id, media);
                        }
                    });
                }
                Err(e) => error!("[{}] URL resolution task failed: {}", context, e),
            },
        }
    }
}
