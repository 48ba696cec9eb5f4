//! Core state aggregate and the single action-processing entry point.
//!
//! `CoreState` owns the window, the request tracker, and the latest
//! location. Every action runs to completion and returns the intents the
//! scheduler must execute; the core itself performs no I/O.

use log::debug;

use crate::chain::{ChainNode, Direction, NeighborRef, WorldRef};
use crate::fetch::{self, FetchOutcome};
use crate::scroll;
use crate::tracker::{CancelHandle, RequestId, RequestTracker};
use crate::window::Window;

/// Inputs to the core.
#[derive(Debug)]
pub enum Action {
    ScrollUp,
    ScrollDown,
    FetchCompleted {
        request: RequestId,
        outcome: FetchOutcome,
    },
    LocationChanged(Option<WorldRef>),
}

/// Side effects requested by the core.
#[derive(Debug, Clone)]
pub enum Intent {
    /// Start fetching `locator`; deliver the result as `Action::FetchCompleted`.
    Fetch {
        request: RequestId,
        coordinate: i64,
        locator: String,
        cancel: CancelHandle,
    },
    /// Abort the request (best effort). It is already untracked.
    Cancel {
        request: RequestId,
        coordinate: i64,
        cancel: CancelHandle,
    },
}

#[derive(Debug)]
pub struct CoreState {
    window: Window,
    tracker: RequestTracker,
    location: Option<WorldRef>,
    scroll_speed: usize,
}

impl CoreState {
    pub fn new(rows: usize, scroll_speed: usize) -> Self {
        Self {
            window: Window::new(rows),
            tracker: RequestTracker::new(),
            location: None,
            scroll_speed,
        }
    }

    /// Coordinate the seed record is placed at: the middle slot.
    pub fn seed_coordinate(&self) -> i64 {
        self.window.cursor() + (self.window.rows() / 2) as i64
    }

    /// Issue the initial fetch for the center slot.
    pub fn seed(&mut self, reference: &NeighborRef) -> Vec<Intent> {
        let coordinate = self.seed_coordinate();
        debug!("core: seeding coordinate {coordinate} with {reference:?}");
        fetch::issue(&self.window, &mut self.tracker, coordinate, reference)
            .into_iter()
            .collect()
    }

    pub fn dispatch(&mut self, action: Action) -> Vec<Intent> {
        match action {
            Action::ScrollUp => self.scroll(Direction::Up),
            Action::ScrollDown => self.scroll(Direction::Down),
            Action::FetchCompleted { request, outcome } => {
                fetch::reconcile(&mut self.window, &mut self.tracker, request, outcome)
            }
            Action::LocationChanged(location) => {
                debug!("core: location {:?} -> {:?}", self.location, location);
                self.location = location;
                vec![]
            }
        }
    }

    fn scroll(&mut self, direction: Direction) -> Vec<Intent> {
        scroll::scroll(&mut self.window, &mut self.tracker, direction, self.scroll_speed)
    }

    pub fn can_scroll(&self, direction: Direction) -> bool {
        scroll::can_scroll(&self.window, direction, self.scroll_speed)
    }

    pub fn current_window(&self) -> &[Option<ChainNode>] {
        self.window.slots()
    }

    pub fn current_location(&self) -> Option<&WorldRef> {
        self.location.as_ref()
    }

    pub fn cursor(&self) -> i64 {
        self.window.cursor()
    }

    pub fn pending_count(&self) -> usize {
        self.tracker.len()
    }

    pub fn is_pending(&self, coordinate: i64) -> bool {
        self.tracker.targets(coordinate)
    }

    /// A visible record whose homeworld is the current location.
    pub fn location_match(&self) -> Option<&ChainNode> {
        let here = self.location.as_ref()?;
        self.window
            .slots()
            .iter()
            .flatten()
            .find(|n| n.is_on(Some(here)))
    }
}
