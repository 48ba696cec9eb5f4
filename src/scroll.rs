//! Scroll controller: admissibility, window shift, pruning, boundary fetch.

use log::debug;

use crate::chain::Direction;
use crate::fetch;
use crate::state::Intent;
use crate::tracker::RequestTracker;
use crate::window::Window;

/// Whether a scroll of `step` slots toward `direction` is allowed.
///
/// The outermost loaded node in the direction of travel must have a
/// neighbor that way, and at least one loaded node must stay visible.
pub fn can_scroll(window: &Window, direction: Direction, step: usize) -> bool {
    let Some((_, edge)) = window.leading_edge(direction) else {
        return false;
    };
    if edge.neighbor(direction).is_absent() {
        return false;
    }
    let rows = window.rows();
    window
        .slots()
        .iter()
        .enumerate()
        .filter(|(_, s)| s.is_some())
        .any(|(i, _)| match direction {
            Direction::Down => i >= step,
            Direction::Up => i + step < rows,
        })
}

/// Apply one scroll action. Inadmissible scrolls change nothing.
pub fn scroll(
    window: &mut Window,
    tracker: &mut RequestTracker,
    direction: Direction,
    step: usize,
) -> Vec<Intent> {
    if !can_scroll(window, direction, step) {
        debug!("scroll {direction:?}: not admissible at cursor {}", window.cursor());
        return vec![];
    }

    let old = window.cursor();
    window.apply_shift(direction, step);
    debug!("scroll {direction:?}: cursor {old} -> {}", window.cursor());

    let mut intents: Vec<Intent> = tracker
        .prune(window.cursor(), window.rows())
        .into_iter()
        .map(|r| Intent::Cancel {
            request: r.id,
            coordinate: r.target,
            cancel: r.cancel,
        })
        .collect();

    // Boundary: one hop past the outermost loaded node.
    if let Some((edge, _)) = window.leading_edge(direction) {
        intents.extend(fetch::decide_fetch(window, tracker, edge + direction.delta()));
    }
    intents
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::NeighborRef;
    use crate::chain::tests::linked;

    #[test]
    fn empty_window_cannot_scroll() {
        let w = Window::new(5);
        assert!(!can_scroll(&w, Direction::Up, 2));
        assert!(!can_scroll(&w, Direction::Down, 2));
    }

    #[test]
    fn absent_master_blocks_up() {
        let mut w = Window::new(5);
        let mut top = linked(0);
        top.master = NeighborRef::Absent;
        w.set(0, top);
        w.set(1, linked(1));
        assert!(!can_scroll(&w, Direction::Up, 2));
        assert!(can_scroll(&w, Direction::Down, 1));
    }

    #[test]
    fn absent_apprentice_blocks_down() {
        let mut w = Window::new(5);
        w.set(3, linked(3));
        let mut bottom = linked(4);
        bottom.apprentice = NeighborRef::Absent;
        w.set(4, bottom);
        assert!(!can_scroll(&w, Direction::Down, 2));
        assert!(can_scroll(&w, Direction::Up, 2));
    }

    #[test]
    fn scroll_that_would_empty_view_is_rejected() {
        let mut w = Window::new(5);
        w.set(0, linked(0));
        w.set(1, linked(1));
        // both loaded nodes would leave the top edge
        assert!(!can_scroll(&w, Direction::Down, 2));
        assert!(can_scroll(&w, Direction::Down, 1));
    }

    #[test]
    fn rejected_scroll_changes_nothing() {
        let mut w = Window::new(5);
        let mut t = RequestTracker::new();
        t.issue(3, 0);
        let intents = scroll(&mut w, &mut t, Direction::Down, 2);
        assert!(intents.is_empty());
        assert_eq!(w.cursor(), 0);
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn scroll_cancels_requests_that_leave_view() {
        let mut w = Window::new(5);
        let mut t = RequestTracker::new();
        for c in 1..=3 {
            w.set(c, linked(c));
        }
        let (r0, _) = t.issue(0, 0);
        let (r4, _) = t.issue(4, 0);
        let intents = scroll(&mut w, &mut t, Direction::Down, 2);
        assert_eq!(w.cursor(), 2);
        assert!(intents.iter().any(
            |i| matches!(i, Intent::Cancel { request, coordinate: 0, .. } if *request == r0)
        ));
        assert!(t.get(r4).is_some());
        // 4 is already pending, so no new boundary fetch
        assert!(!intents.iter().any(|i| matches!(i, Intent::Fetch { .. })));
    }

    #[test]
    fn scroll_up_fetches_past_top_edge() {
        let mut w = Window::new(5);
        let mut t = RequestTracker::new();
        for c in 0..5 {
            w.set(c, linked(c));
        }
        let intents = scroll(&mut w, &mut t, Direction::Up, 2);
        assert_eq!(w.cursor(), -2);
        assert_eq!(intents.len(), 1);
        assert!(matches!(intents[0], Intent::Fetch { coordinate: -1, .. }));
    }
}
