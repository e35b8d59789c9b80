//! Background discovery of every artwork id the catalog holds.
//!
//! The enumerator walks the catalog from page 1 with a large page size and
//! publishes a [`UniverseSnapshot`] after every page, so consumers see the
//! universe grow instead of waiting for the last page.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use shared::domain::{ArtworkId, PageRequest};
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, info, warn};

use crate::provider::PageProvider;

pub const UNIVERSE_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumerationStatus {
    Running,
    Complete,
    /// Stopped early on a failed or malformed page; the ids gathered so far stay.
    Aborted { reason: String },
    Cancelled,
}

impl EnumerationStatus {
    pub fn is_finished(&self) -> bool {
        !matches!(self, Self::Running)
    }
}

#[derive(Debug, Clone)]
pub struct UniverseSnapshot {
    /// Distinguishes runs; a restarted enumeration starts a new generation.
    pub generation: u64,
    pub ids: Vec<ArtworkId>,
    pub pages_fetched: u32,
    pub total_pages: Option<u32>,
    pub status: EnumerationStatus,
}

impl UniverseSnapshot {
    fn starting(generation: u64) -> Self {
        Self {
            generation,
            ids: Vec::new(),
            pages_fetched: 0,
            total_pages: None,
            status: EnumerationStatus::Running,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.status == EnumerationStatus::Complete
    }
}

pub struct UniverseEnumerator {
    provider: Arc<dyn PageProvider>,
    page_size: u32,
    runs: AtomicU64,
}

impl UniverseEnumerator {
    pub fn new(provider: Arc<dyn PageProvider>, page_size: u32) -> Self {
        Self {
            provider,
            page_size: page_size.max(1),
            runs: AtomicU64::new(0),
        }
    }

    /// Starts a fresh enumeration from page 1 on a background task.
    pub fn spawn(&self) -> UniverseHandle {
        let generation = self.next_generation();
        let (updates, receiver) = watch::channel(UniverseSnapshot::starting(generation));
        let (cancel, cancel_rx) = watch::channel(false);
        let provider = Arc::clone(&self.provider);
        let page_size = self.page_size;

        tokio::spawn(async move {
            enumerate(provider.as_ref(), page_size, &updates, cancel_rx).await;
        });

        UniverseHandle { receiver, cancel }
    }

    /// Runs a full enumeration on the current task and returns the final snapshot.
    pub async fn run(&self) -> UniverseSnapshot {
        let generation = self.next_generation();
        let (updates, receiver) = watch::channel(UniverseSnapshot::starting(generation));
        // Held for the duration of the run so the loop never sees a cancellation.
        let (_cancel, cancel_rx) = watch::channel(false);
        enumerate(self.provider.as_ref(), self.page_size, &updates, cancel_rx).await;
        let snapshot = receiver.borrow().clone();
        snapshot
    }

    fn next_generation(&self) -> u64 {
        self.runs.fetch_add(1, Ordering::Relaxed) + 1
    }
}

/// Owner of a running enumeration. Dropping the handle cancels the run.
pub struct UniverseHandle {
    receiver: watch::Receiver<UniverseSnapshot>,
    cancel: watch::Sender<bool>,
}

impl UniverseHandle {
    pub fn snapshot(&self) -> UniverseSnapshot {
        self.receiver.borrow().clone()
    }

    pub fn generation(&self) -> u64 {
        self.receiver.borrow().generation
    }

    pub fn status(&self) -> EnumerationStatus {
        self.receiver.borrow().status.clone()
    }

    /// Ids published since `known`, plus the run's generation and status.
    pub fn tail(&self, known: usize) -> (u64, Vec<ArtworkId>, EnumerationStatus) {
        let snapshot = self.receiver.borrow();
        let start = known.min(snapshot.ids.len());
        (
            snapshot.generation,
            snapshot.ids[start..].to_vec(),
            snapshot.status.clone(),
        )
    }

    /// Stream of snapshots; each item clones the id list.
    pub fn updates(&self) -> WatchStream<UniverseSnapshot> {
        WatchStream::new(self.receiver.clone())
    }

    pub fn cancel(&self) {
        self.cancel.send_replace(true);
    }

    /// Waits until the run completes, aborts or is cancelled.
    pub async fn wait(&mut self) -> UniverseSnapshot {
        if let Ok(snapshot) = self.receiver.wait_for(|s| s.status.is_finished()).await {
            return snapshot.clone();
        }
        self.receiver.borrow().clone()
    }
}

impl Drop for UniverseHandle {
    fn drop(&mut self) {
        self.cancel.send_replace(true);
    }
}

async fn enumerate(
    provider: &dyn PageProvider,
    page_size: u32,
    updates: &watch::Sender<UniverseSnapshot>,
    mut cancel: watch::Receiver<bool>,
) {
    let mut page = 1u32;
    let status = loop {
        let request = PageRequest::new(page, page_size);
        let result = tokio::select! {
            biased;
            _ = cancelled(&mut cancel) => break EnumerationStatus::Cancelled,
            result = provider.fetch_page(request) => result,
        };

        match result {
            Ok(body) => {
                let last = body.pagination.is_last_page();
                updates.send_modify(|snapshot| {
                    snapshot.ids.extend(body.ids());
                    snapshot.pages_fetched += 1;
                    snapshot.total_pages = Some(body.pagination.total_pages);
                });
                debug!(
                    page,
                    total_pages = body.pagination.total_pages,
                    ids = body.data.len(),
                    "universe: page enumerated"
                );
                if last {
                    break EnumerationStatus::Complete;
                }
                page = body.pagination.current_page.max(page) + 1;
            }
            Err(error) if error.is_malformed() => {
                debug!(page, %error, "universe: malformed page, keeping partial universe");
                break EnumerationStatus::Aborted {
                    reason: error.to_string(),
                };
            }
            Err(error) => {
                warn!(page, %error, "universe: page fetch failed, keeping partial universe");
                break EnumerationStatus::Aborted {
                    reason: error.to_string(),
                };
            }
        }
    };

    updates.send_modify(|snapshot| snapshot.status = status.clone());
    let snapshot = updates.borrow();
    info!(
        generation = snapshot.generation,
        ids = snapshot.ids.len(),
        pages = snapshot.pages_fetched,
        status = ?snapshot.status,
        "universe: enumeration finished"
    );
}

/// Resolves once cancellation is requested or the handle is gone.
async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    while !*cancel.borrow_and_update() {
        if cancel.changed().await.is_err() {
            return;
        }
    }
}

#[cfg(test)]
#[path = "tests/universe_tests.rs"]
mod tests;
