use std::fmt::Write as _;

use client_core::{EnumerationStatus, TableView};

const TITLE_WIDTH: usize = 36;
const ORIGIN_WIDTH: usize = 16;
const ARTIST_WIDTH: usize = 28;
const INSCRIPTIONS_WIDTH: usize = 24;

pub fn render_table(view: &TableView, universe: &EnumerationStatus) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} {:>8}  {:<tw$}  {:<ow$}  {:<aw$}  {:<iw$}  {:>6}  {:>6}",
        checkbox(view.header_checked),
        "id",
        "title",
        "place_of_origin",
        "artist_display",
        "inscriptions",
        "start",
        "end",
        tw = TITLE_WIDTH,
        ow = ORIGIN_WIDTH,
        aw = ARTIST_WIDTH,
        iw = INSCRIPTIONS_WIDTH,
    );

    if view.rows.is_empty() {
        out.push_str("    (no records)\n");
    }

    for row in &view.rows {
        let artwork = &row.artwork;
        let _ = writeln!(
            out,
            "{} {:>8}  {:<tw$}  {:<ow$}  {:<aw$}  {:<iw$}  {:>6}  {:>6}",
            checkbox(row.checked),
            artwork.id.0,
            clip(&artwork.title, TITLE_WIDTH),
            clip(&artwork.place_of_origin, ORIGIN_WIDTH),
            clip(&artwork.artist_display, ARTIST_WIDTH),
            clip(artwork.inscriptions.as_deref().unwrap_or("-"), INSCRIPTIONS_WIDTH),
            artwork.date_start,
            artwork.date_end,
            tw = TITLE_WIDTH,
            ow = ORIGIN_WIDTH,
            aw = ARTIST_WIDTH,
            iw = INSCRIPTIONS_WIDTH,
        );
    }

    let _ = writeln!(
        out,
        "showing {} to {} of {} | page {}/{} ({} per page) | selected {} | {}",
        view.first,
        view.last,
        view.total_records,
        view.current_page,
        view.total_pages,
        view.page_size,
        view.selected_count,
        universe_line(view.universe_known, universe),
    );
    out
}

fn universe_line(known: usize, status: &EnumerationStatus) -> String {
    match status {
        EnumerationStatus::Running => format!("universe {known} ids so far"),
        EnumerationStatus::Complete => format!("universe {known} ids"),
        EnumerationStatus::Aborted { reason } => {
            format!("universe {known} ids (incomplete: {reason})")
        }
        EnumerationStatus::Cancelled => format!("universe {known} ids (cancelled)"),
    }
}

fn checkbox(checked: bool) -> &'static str {
    if checked {
        "[x]"
    } else {
        "[ ]"
    }
}

/// Cuts on char boundaries and collapses line breaks.
fn clip(text: &str, width: usize) -> String {
    let flat: String = text
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    if flat.chars().count() <= width {
        return flat;
    }
    let mut clipped: String = flat.chars().take(width.saturating_sub(1)).collect();
    clipped.push('~');
    clipped
}
