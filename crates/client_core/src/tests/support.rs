use std::{collections::HashMap, sync::Arc, time::Duration};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use shared::{
    domain::{Artwork, ArtworkId, PageRequest},
    error::PageBodyError,
    protocol::{ArtworkPage, Pagination},
};
use storage::{KeyValueStore, MemoryKeyValueStore};
use tokio::sync::Mutex;

use crate::{error::ProviderError, provider::PageProvider};

pub(crate) fn artwork(id: i64) -> Artwork {
    Artwork {
        id: ArtworkId(id),
        title: format!("Artwork {id}"),
        place_of_origin: "Chicago".to_string(),
        artist_display: "Unknown artist".to_string(),
        inscriptions: None,
        date_start: 1900,
        date_end: 1901,
    }
}

pub(crate) fn ids(raw: &[i64]) -> Vec<ArtworkId> {
    raw.iter().copied().map(ArtworkId).collect()
}

#[derive(Clone)]
enum Layout {
    /// Fixed pages regardless of the requested limit.
    Pages(Vec<Vec<i64>>),
    /// Ids `1..=total`, sliced by the requested limit.
    Catalog(u64),
}

#[derive(Clone)]
pub(crate) enum Failure {
    /// 503 from the catalog.
    Unavailable,
    Malformed,
}

/// In-process catalog that records every request it serves.
pub(crate) struct ScriptedProvider {
    layout: Layout,
    failures: HashMap<u32, Failure>,
    delay: Option<Duration>,
    requests: Mutex<Vec<PageRequest>>,
}

impl ScriptedProvider {
    pub(crate) fn from_pages(pages: Vec<Vec<i64>>) -> Self {
        Self::with_layout(Layout::Pages(pages))
    }

    pub(crate) fn catalog(total: u64) -> Self {
        Self::with_layout(Layout::Catalog(total))
    }

    fn with_layout(layout: Layout) -> Self {
        Self {
            layout,
            failures: HashMap::new(),
            delay: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing_on(mut self, page: u32, failure: Failure) -> Self {
        self.failures.insert(page, failure);
        self
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) async fn requests(&self) -> Vec<PageRequest> {
        self.requests.lock().await.clone()
    }

    fn build_page(&self, request: PageRequest) -> ArtworkPage {
        match &self.layout {
            Layout::Pages(pages) => {
                let total: u64 = pages.iter().map(|page| page.len() as u64).sum();
                let data = pages
                    .get(request.page as usize - 1)
                    .map(|page| page.iter().copied().map(artwork).collect())
                    .unwrap_or_default();
                ArtworkPage {
                    data,
                    pagination: Pagination {
                        current_page: request.page,
                        total_pages: pages.len() as u32,
                        total,
                        limit: Some(request.limit),
                    },
                }
            }
            Layout::Catalog(total) => {
                let limit = u64::from(request.limit);
                let start = u64::from(request.page - 1) * limit + 1;
                let end = (start + limit - 1).min(*total);
                let data = (start..=end).map(|id| artwork(id as i64)).collect();
                ArtworkPage {
                    data,
                    pagination: Pagination {
                        current_page: request.page,
                        total_pages: total.div_ceil(limit) as u32,
                        total: *total,
                        limit: Some(request.limit),
                    },
                }
            }
        }
    }
}

#[async_trait]
impl PageProvider for ScriptedProvider {
    async fn fetch_page(&self, request: PageRequest) -> Result<ArtworkPage, ProviderError> {
        self.requests.lock().await.push(request);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match self.failures.get(&request.page) {
            Some(Failure::Unavailable) => Err(ProviderError::Status {
                status: 503,
                message: format!("catalog unavailable on page {}", request.page),
                api: None,
            }),
            Some(Failure::Malformed) => Err(ProviderError::Malformed(PageBodyError::MissingData)),
            None => Ok(self.build_page(request)),
        }
    }
}

/// Memory store that counts writes and can be told to reject them.
#[derive(Default)]
pub(crate) struct CountingStore {
    inner: MemoryKeyValueStore,
    writes: Mutex<u32>,
    reject_writes: bool,
}

impl CountingStore {
    pub(crate) fn rejecting() -> Self {
        Self {
            reject_writes: true,
            ..Self::default()
        }
    }

    pub(crate) async fn seeded(key: &str, value: &str) -> Arc<Self> {
        let store = Self::default();
        store.inner.set(key, value).await.expect("seed");
        Arc::new(store)
    }

    pub(crate) async fn writes(&self) -> u32 {
        *self.writes.lock().await
    }
}

#[async_trait]
impl KeyValueStore for CountingStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        *self.writes.lock().await += 1;
        if self.reject_writes {
            return Err(anyhow!("quota exceeded"));
        }
        self.inner.set(key, value).await
    }
}
