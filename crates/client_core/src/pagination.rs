use std::sync::Arc;

use shared::{
    domain::{Artwork, PageRequest},
    protocol::{ArtworkPage, PageEvent},
};
use tracing::{debug, warn};

use crate::{
    error::{PaginationError, ProviderError},
    provider::PageProvider,
};

pub const DEFAULT_PAGE_SIZE: u32 = 5;
pub const ROWS_PER_PAGE_OPTIONS: [u32; 4] = [5, 10, 25, 50];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationState {
    /// 1-indexed.
    pub current_page: u32,
    pub page_size: u32,
    pub total_records: u64,
}

impl PaginationState {
    pub fn new(page_size: u32) -> Self {
        Self {
            current_page: 1,
            page_size,
            total_records: 0,
        }
    }

    /// Zero-based offset of the first record on the current page.
    pub fn offset(&self) -> u64 {
        u64::from(self.current_page.saturating_sub(1)) * u64::from(self.page_size)
    }

    pub fn total_pages(&self) -> u64 {
        if self.page_size == 0 {
            return 0;
        }
        self.total_records.div_ceil(u64::from(self.page_size))
    }

    pub fn request(&self) -> PageRequest {
        PageRequest::new(self.current_page, self.page_size)
    }
}

/// A page fetch tagged with the sequence number it was issued under.
pub struct PendingFetch {
    seq: u64,
    request: PageRequest,
    provider: Arc<dyn PageProvider>,
}

impl PendingFetch {
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn request(&self) -> PageRequest {
        self.request
    }

    pub async fn run(self) -> FetchOutcome {
        let result = self.provider.fetch_page(self.request).await;
        FetchOutcome {
            seq: self.seq,
            request: self.request,
            result,
        }
    }
}

pub struct FetchOutcome {
    pub seq: u64,
    pub request: PageRequest,
    pub result: Result<ArtworkPage, ProviderError>,
}

/// Lazy pagination over a [`PageProvider`].
///
/// Every page change issues a new sequence number; only the response for the
/// most recently issued number is applied, whatever order responses arrive in.
pub struct PaginationController {
    provider: Arc<dyn PageProvider>,
    state: PaginationState,
    rows: Vec<Artwork>,
    issued: u64,
    applied: Option<u64>,
    /// Page and size the current rows were fetched with.
    displayed: Option<PageRequest>,
}

impl PaginationController {
    pub fn new(provider: Arc<dyn PageProvider>, page_size: u32) -> Result<Self, PaginationError> {
        validate_page_size(page_size)?;
        Ok(Self {
            provider,
            state: PaginationState::new(page_size),
            rows: Vec::new(),
            issued: 0,
            applied: None,
            displayed: None,
        })
    }

    pub fn state(&self) -> PaginationState {
        self.state
    }

    pub fn rows(&self) -> &[Artwork] {
        &self.rows
    }

    /// State matching [`Self::rows`]: the requested state until a page has
    /// been applied, afterwards the page and size of the last applied
    /// response. A pending or failed fetch does not move it.
    pub fn displayed_state(&self) -> PaginationState {
        match self.displayed {
            Some(request) => PaginationState {
                current_page: request.page,
                page_size: request.limit,
                total_records: self.state.total_records,
            },
            None => self.state,
        }
    }

    /// Whether `page` at `page_size` is already on display and nothing newer is pending.
    pub fn is_showing(&self, page: u32, page_size: u32) -> bool {
        self.is_current() && self.displayed == Some(PageRequest::new(page, page_size))
    }

    pub fn latest_seq(&self) -> u64 {
        self.issued
    }

    /// Whether the rows on display belong to the latest issued request.
    pub fn is_current(&self) -> bool {
        self.applied == Some(self.issued)
    }

    /// Sets page and page size together and issues a fetch for them.
    pub fn change_page(
        &mut self,
        page: u32,
        page_size: u32,
    ) -> Result<PendingFetch, PaginationError> {
        if page == 0 {
            return Err(PaginationError::InvalidPage(page));
        }
        validate_page_size(page_size)?;
        self.state.current_page = page;
        self.state.page_size = page_size;
        Ok(self.issue())
    }

    /// Sets the page size and returns to page 1.
    pub fn change_page_size(&mut self, page_size: u32) -> Result<PendingFetch, PaginationError> {
        self.change_page(1, page_size)
    }

    /// Paginator callback: `event.page` is zero-indexed.
    pub fn on_page(&mut self, event: PageEvent) -> Result<PendingFetch, PaginationError> {
        self.change_page(event.page.saturating_add(1), event.rows)
    }

    /// Re-issues a fetch for the current page and size.
    pub fn refetch(&mut self) -> PendingFetch {
        self.issue()
    }

    /// Applies a fetch result. Returns `Ok(false)` for a superseded response.
    pub fn apply(&mut self, outcome: FetchOutcome) -> Result<bool, PaginationError> {
        if outcome.seq != self.issued {
            debug!(
                seq = outcome.seq,
                latest = self.issued,
                page = outcome.request.page,
                "pagination: discarding stale response"
            );
            return Ok(false);
        }

        match outcome.result {
            Ok(page) => {
                if page.pagination.current_page >= 1 {
                    self.state.current_page = page.pagination.current_page;
                }
                self.state.total_records = page.pagination.total;
                self.rows = page.data;
                self.applied = Some(outcome.seq);
                self.displayed = Some(PageRequest::new(
                    self.state.current_page,
                    outcome.request.limit,
                ));
                debug!(
                    seq = outcome.seq,
                    page = self.state.current_page,
                    rows = self.rows.len(),
                    total = self.state.total_records,
                    "pagination: page applied"
                );
                Ok(true)
            }
            Err(error) => {
                warn!(
                    seq = outcome.seq,
                    page = outcome.request.page,
                    %error,
                    "pagination: page fetch failed"
                );
                Err(error.into())
            }
        }
    }

    pub async fn go_to(&mut self, page: u32, page_size: u32) -> Result<(), PaginationError> {
        let fetch = self.change_page(page, page_size)?;
        self.apply(fetch.run().await).map(|_| ())
    }

    /// Like [`Self::go_to`], but skips the request when the page is already shown.
    pub async fn show(&mut self, page: u32, page_size: u32) -> Result<(), PaginationError> {
        if self.is_showing(page, page_size) {
            debug!(page, limit = page_size, "pagination: page already shown");
            return Ok(());
        }
        self.go_to(page, page_size).await
    }

    pub async fn set_page_size(&mut self, page_size: u32) -> Result<(), PaginationError> {
        let fetch = self.change_page_size(page_size)?;
        self.apply(fetch.run().await).map(|_| ())
    }

    pub async fn refresh(&mut self) -> Result<(), PaginationError> {
        let fetch = self.refetch();
        self.apply(fetch.run().await).map(|_| ())
    }

    fn issue(&mut self) -> PendingFetch {
        self.issued += 1;
        debug!(
            seq = self.issued,
            page = self.state.current_page,
            limit = self.state.page_size,
            "pagination: fetch issued"
        );
        PendingFetch {
            seq: self.issued,
            request: self.state.request(),
            provider: Arc::clone(&self.provider),
        }
    }
}

fn validate_page_size(page_size: u32) -> Result<(), PaginationError> {
    if page_size == 0 {
        return Err(PaginationError::InvalidPageSize(page_size));
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/pagination_tests.rs"]
mod tests;
