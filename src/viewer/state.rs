//! Layout and row formatting. Pure, no terminal I/O.

use crate::chain::{ChainNode, Direction};
use crate::state::CoreState;

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

pub(super) struct Layout {
    pub cols: u16,
    pub header_row: u16,
    pub first_slot_row: u16,
    pub status_row: u16,
}

pub(super) fn compute_layout(term_cols: u16, term_rows: u16) -> Layout {
    Layout {
        cols: term_cols,
        header_row: 0,
        first_slot_row: 2,
        status_row: term_rows.saturating_sub(1),
    }
}

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq)]
pub(super) enum RowKind {
    Record,
    /// Record on the current location.
    Highlighted,
    Loading,
    Empty,
}

pub(super) struct Row {
    pub text: String,
    pub kind: RowKind,
}

fn record_text(node: &ChainNode) -> String {
    format!(" {:<32} Homeworld: {}", node.name, node.homeworld.name)
}

/// One display row per window slot, top to bottom.
pub(super) fn rows(core: &CoreState) -> Vec<Row> {
    let cursor = core.cursor();
    core.current_window()
        .iter()
        .enumerate()
        .map(|(i, slot)| {
            let coordinate = cursor + i as i64;
            match slot {
                Some(node) if node.is_on(core.current_location()) => Row {
                    text: record_text(node),
                    kind: RowKind::Highlighted,
                },
                Some(node) => Row {
                    text: record_text(node),
                    kind: RowKind::Record,
                },
                None if core.is_pending(coordinate) => Row {
                    text: " loading...".into(),
                    kind: RowKind::Loading,
                },
                None => Row {
                    text: String::new(),
                    kind: RowKind::Empty,
                },
            }
        })
        .collect()
}

pub(super) fn header_text(core: &CoreState) -> String {
    match (core.current_location(), core.location_match()) {
        (Some(world), Some(node)) => {
            format!(" Obi-Wan currently on {} | {} is here", world.name, node.name)
        }
        (Some(world), None) => format!(" Obi-Wan currently on {}", world.name),
        (None, _) => " Obi-Wan location unknown".into(),
    }
}

/// Status line: cursor, in-flight count, and the scroll affordances.
pub(super) fn status_text(core: &CoreState, acc_peek: Option<u32>) -> String {
    let arrow = |d: Direction, key: &str, label: &str| {
        if core.can_scroll(d) {
            format!("{key}:{label}")
        } else {
            format!("{key}:-")
        }
    };
    let prefix = match acc_peek {
        Some(n) => format!(" :{n}_ |"),
        None => String::new(),
    };
    format!(
        "{prefix} cursor={} pending={} | [{} {}] q:quit",
        core.cursor(),
        core.pending_count(),
        arrow(Direction::Up, "k", "up"),
        arrow(Direction::Down, "j", "down"),
    )
}
