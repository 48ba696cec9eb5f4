//! Fetch orchestration: which coordinates to fetch, and where results land.
//!
//! Fetches propagate outward one hop at a time. A coordinate is fetched only
//! when an adjacent loaded node points at it, its slot is empty, and no
//! request already targets it. Placement always uses the cursor at
//! completion time, so completions may arrive in any order.

use log::{debug, trace, warn};

use crate::chain::{ChainNode, Direction, NeighborRef};
use crate::state::Intent;
use crate::tracker::{RequestId, RequestTracker};
use crate::transport::FetchError;
use crate::window::{Slot, Window};

/// Result of one fetch as delivered by the transport.
pub type FetchOutcome = Result<ChainNode, FetchError>;

/// The reference that points at `coordinate` from an adjacent loaded node:
/// the apprentice of the node above, or the master of the node below.
fn supplying_ref(window: &Window, coordinate: i64) -> Option<&NeighborRef> {
    let above = window.node(coordinate - 1).map(|n| n.neighbor(Direction::Down));
    let below = window.node(coordinate + 1).map(|n| n.neighbor(Direction::Up));
    match (above, below) {
        (Some(r @ NeighborRef::Unresolved { .. }), _) => Some(r),
        (_, Some(r @ NeighborRef::Unresolved { .. })) => Some(r),
        (Some(r), _) | (None, Some(r)) => Some(r),
        (None, None) => None,
    }
}

/// Issue a fetch for `coordinate` with an explicit reference.
///
/// Used for the seed, where no adjacent node exists yet.
pub fn issue(
    window: &Window,
    tracker: &mut RequestTracker,
    coordinate: i64,
    reference: &NeighborRef,
) -> Option<Intent> {
    if !matches!(window.get(coordinate), Slot::Empty) || tracker.targets(coordinate) {
        return None;
    }
    let NeighborRef::Unresolved { locator, id } = reference else {
        trace!("fetch: coordinate {coordinate} has no neighbor, leaving empty");
        return None;
    };
    let (request, cancel) = tracker.issue(coordinate, window.cursor());
    debug!("fetch: {request} coordinate {coordinate} -> remote id {id} ({locator})");
    Some(Intent::Fetch {
        request,
        coordinate,
        locator: locator.clone(),
        cancel,
    })
}

/// Decide whether `coordinate` needs a fetch and issue it if so.
pub fn decide_fetch(window: &Window, tracker: &mut RequestTracker, coordinate: i64) -> Option<Intent> {
    let reference = supplying_ref(window, coordinate)?;
    issue(window, tracker, coordinate, reference)
}

/// Run [`decide_fetch`] for both neighbors of `coordinate`.
pub fn expand_from(window: &Window, tracker: &mut RequestTracker, coordinate: i64) -> Vec<Intent> {
    [Direction::Up, Direction::Down]
        .into_iter()
        .filter_map(|d| decide_fetch(window, tracker, coordinate + d.delta()))
        .collect()
}

/// Fold a completed fetch into the window.
///
/// Unknown ids are stale (pruned or duplicate) and change nothing. Tracked
/// requests are always removed, whether the node lands, fails, or has
/// scrolled out of view.
pub fn reconcile(
    window: &mut Window,
    tracker: &mut RequestTracker,
    request: RequestId,
    outcome: FetchOutcome,
) -> Vec<Intent> {
    let Some(pending) = tracker.take(request) else {
        debug!("fetch: stale completion {request} discarded");
        return vec![];
    };
    let coordinate = pending.target;
    match outcome {
        Ok(node) => {
            let name = node.name.clone();
            if window.set(coordinate, node) {
                debug!(
                    "fetch: {request} placed '{name}' at coordinate {coordinate} (slot {}, issued at cursor {}, now {})",
                    coordinate - window.cursor(),
                    pending.issued_at_cursor,
                    window.cursor()
                );
                expand_from(window, tracker, coordinate)
            } else {
                debug!(
                    "fetch: {request} for coordinate {coordinate} landed out of view (cursor={}), dropped",
                    window.cursor()
                );
                vec![]
            }
        }
        Err(e) => {
            warn!("fetch: {request} for coordinate {coordinate} failed: {e}");
            vec![]
        }
    }
}
