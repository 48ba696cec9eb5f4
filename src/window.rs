//! Window state: a fixed-length run of slots plus the scroll cursor.
//!
//! Slot `i` always holds chain coordinate `cursor + i`. Shifting moves the
//! content and the cursor together, so the two can never disagree.

use log::trace;

use crate::chain::{ChainNode, Direction};

/// Lookup result for a chain coordinate.
#[derive(Debug, PartialEq, Eq)]
pub enum Slot<'a> {
    Loaded(&'a ChainNode),
    Empty,
    /// The coordinate is outside `[cursor, cursor + rows)`.
    OutOfView,
}

#[derive(Debug, Clone)]
pub struct Window {
    slots: Vec<Option<ChainNode>>,
    cursor: i64,
}

impl Window {
    /// An empty window of `rows` slots at cursor 0.
    pub fn new(rows: usize) -> Self {
        Self {
            slots: vec![None; rows],
            cursor: 0,
        }
    }

    pub fn rows(&self) -> usize {
        self.slots.len()
    }

    /// Chain coordinate of slot 0.
    pub fn cursor(&self) -> i64 {
        self.cursor
    }

    pub fn slots(&self) -> &[Option<ChainNode>] {
        &self.slots
    }

    /// Slot index for `coordinate`, or `None` when it is out of view.
    pub fn slot_index(&self, coordinate: i64) -> Option<usize> {
        let idx = coordinate.checked_sub(self.cursor)?;
        usize::try_from(idx).ok().filter(|&i| i < self.slots.len())
    }

    pub fn get(&self, coordinate: i64) -> Slot<'_> {
        match self.slot_index(coordinate) {
            None => Slot::OutOfView,
            Some(i) => match &self.slots[i] {
                Some(node) => Slot::Loaded(node),
                None => Slot::Empty,
            },
        }
    }

    /// Loaded node at `coordinate`, if any.
    pub fn node(&self, coordinate: i64) -> Option<&ChainNode> {
        match self.get(coordinate) {
            Slot::Loaded(node) => Some(node),
            Slot::Empty | Slot::OutOfView => None,
        }
    }

    /// Place `node` at `coordinate`. Returns false (and drops the node) when
    /// the coordinate has scrolled out of view.
    pub fn set(&mut self, coordinate: i64, node: ChainNode) -> bool {
        match self.slot_index(coordinate) {
            Some(i) => {
                self.slots[i] = Some(node);
                true
            }
            None => {
                trace!("window: set({coordinate}) ignored, cursor={}", self.cursor);
                false
            }
        }
    }

    /// Shift by `step` slots in `direction`.
    ///
    /// `Down` drops the first `step` slots, appends `step` empty ones, and
    /// advances the cursor; `Up` is the mirror image. A `step` of `rows` or
    /// more empties the whole window.
    pub fn apply_shift(&mut self, direction: Direction, step: usize) {
        let rows = self.slots.len();
        let n = step.min(rows);
        match direction {
            Direction::Down => {
                self.slots.rotate_left(n);
                self.slots[rows - n..].fill(None);
                self.cursor += step as i64;
            }
            Direction::Up => {
                self.slots.rotate_right(n);
                self.slots[..n].fill(None);
                self.cursor -= step as i64;
            }
        }
    }

    /// The loaded node furthest along `direction`, with its coordinate.
    pub fn leading_edge(&self, direction: Direction) -> Option<(i64, &ChainNode)> {
        let mut loaded = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|n| (self.cursor + i as i64, n)));
        match direction {
            Direction::Up => loaded.next(),
            Direction::Down => loaded.last(),
        }
    }
}
