use std::sync::Arc;

use anyhow::Result;
use storage::KeyValueStore;
use tracing::{info, warn};

use crate::{
    pagination::{PaginationController, DEFAULT_PAGE_SIZE},
    provider::PageProvider,
    selection::{SelectAllPolicy, SelectionCoordinator, DEFAULT_SELECTION_KEY},
    universe::{EnumerationStatus, UniverseEnumerator, UniverseHandle, UNIVERSE_PAGE_SIZE},
    view::TableView,
};

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub page_size: u32,
    pub universe_page_size: u32,
    pub selection_key: String,
    pub select_all_policy: SelectAllPolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            universe_page_size: UNIVERSE_PAGE_SIZE,
            selection_key: DEFAULT_SELECTION_KEY.to_string(),
            select_all_policy: SelectAllPolicy::default(),
        }
    }
}

/// One mounted table: persisted selection, background universe, current page.
pub struct Session {
    selection: SelectionCoordinator,
    pagination: PaginationController,
    enumerator: UniverseEnumerator,
    universe: UniverseHandle,
    universe_generation: u64,
    universe_seen: usize,
}

impl Session {
    /// Loads the selection, starts enumerating the universe, then fetches the
    /// first page. A failed first page leaves the table empty.
    pub async fn start(
        config: SessionConfig,
        provider: Arc<dyn PageProvider>,
        store: Arc<dyn KeyValueStore>,
    ) -> Result<Self> {
        let selection =
            SelectionCoordinator::load(store, config.selection_key, config.select_all_policy)
                .await?;
        let enumerator = UniverseEnumerator::new(Arc::clone(&provider), config.universe_page_size);
        let universe = enumerator.spawn();
        let universe_generation = universe.generation();
        let mut pagination = PaginationController::new(provider, config.page_size)?;

        if let Err(error) = pagination.refresh().await {
            warn!(%error, "session: initial page fetch failed");
        }
        info!(
            page_size = pagination.state().page_size,
            total = pagination.state().total_records,
            "session: started"
        );

        Ok(Self {
            selection,
            pagination,
            enumerator,
            universe,
            universe_generation,
            universe_seen: 0,
        })
    }

    pub fn selection(&self) -> &SelectionCoordinator {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut SelectionCoordinator {
        &mut self.selection
    }

    pub fn pagination(&self) -> &PaginationController {
        &self.pagination
    }

    pub fn pagination_mut(&mut self) -> &mut PaginationController {
        &mut self.pagination
    }

    pub fn universe(&self) -> &UniverseHandle {
        &self.universe
    }

    /// Moves ids published by the enumerator into the coordinator.
    pub async fn sync_universe(&mut self) -> EnumerationStatus {
        if self.universe.generation() != self.universe_generation {
            self.selection.reset_universe();
            self.universe_generation = self.universe.generation();
            self.universe_seen = 0;
        }

        let (_, ids, status) = self.universe.tail(self.universe_seen);
        self.universe_seen += ids.len();
        self.selection.extend_universe(&ids).await;
        self.selection
            .set_universe_complete(status == EnumerationStatus::Complete);
        status
    }

    pub async fn wait_for_universe(&mut self) -> EnumerationStatus {
        self.universe.wait().await;
        self.sync_universe().await
    }

    /// Cancels the running enumeration and starts over from page 1.
    pub async fn restart_universe(&mut self) {
        self.universe = self.enumerator.spawn();
        self.sync_universe().await;
    }

    pub fn view(&self) -> TableView {
        TableView::build(&self.pagination, &self.selection)
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
