//! Cross-page artwork selection over a paginated catalog API.
//!
//! [`Session`] wires the pieces together: a [`SelectionCoordinator`] restored
//! from a [`storage::KeyValueStore`], a background [`UniverseEnumerator`]
//! discovering every id, and a [`PaginationController`] for the displayed page.

pub mod error;
pub mod pagination;
pub mod provider;
pub mod selection;
pub mod session;
pub mod universe;
pub mod view;

pub use error::{PaginationError, ProviderError, SelectionError};
pub use pagination::{
    FetchOutcome, PaginationController, PaginationState, PendingFetch, DEFAULT_PAGE_SIZE,
    ROWS_PER_PAGE_OPTIONS,
};
pub use provider::{HttpPageProvider, PageProvider, DEFAULT_API_BASE_URL};
pub use selection::{SelectAllPolicy, SelectionCoordinator, SelectionSet, DEFAULT_SELECTION_KEY};
pub use session::{Session, SessionConfig};
pub use universe::{
    EnumerationStatus, UniverseEnumerator, UniverseHandle, UniverseSnapshot, UNIVERSE_PAGE_SIZE,
};
pub use view::{TableRow, TableView};

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;
