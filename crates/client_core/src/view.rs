use shared::domain::Artwork;

use crate::{pagination::PaginationController, selection::SelectionCoordinator};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub artwork: Artwork,
    pub checked: bool,
}

/// Everything a table front end needs, derived from pagination and selection.
///
/// Page numbers and record positions describe the rows actually shown, so a
/// pending or failed page change leaves them as they were.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableView {
    pub rows: Vec<TableRow>,
    /// Header checkbox: every id in the known universe is checked.
    pub header_checked: bool,
    pub current_page: u32,
    pub page_size: u32,
    pub total_pages: u64,
    pub total_records: u64,
    /// 1-based position of the first and last displayed record; 0 when empty.
    pub first: u64,
    pub last: u64,
    pub selected_count: usize,
    pub universe_known: usize,
    pub universe_complete: bool,
}

impl TableView {
    pub fn build(pagination: &PaginationController, selection: &SelectionCoordinator) -> Self {
        let state = pagination.displayed_state();
        let rows: Vec<TableRow> = pagination
            .rows()
            .iter()
            .map(|artwork| TableRow {
                checked: selection.is_checked(artwork.id),
                artwork: artwork.clone(),
            })
            .collect();

        let (first, last) = if rows.is_empty() {
            (0, 0)
        } else {
            let first = state.offset() + 1;
            (first, first + rows.len() as u64 - 1)
        };

        Self {
            header_checked: selection.all_selected(),
            current_page: state.current_page,
            page_size: state.page_size,
            total_pages: state.total_pages(),
            total_records: state.total_records,
            first,
            last,
            selected_count: selection.selection().checked_count(),
            universe_known: selection.universe().len(),
            universe_complete: selection.is_universe_complete(),
            rows,
        }
    }
}
