//! Chain node model: records, worlds, and neighbor references.
//!
//! Pure data. A record points at most one hop in each direction; the
//! neighbor becomes a full [`ChainNode`] in its own window slot once fetched,
//! so the reference only decides whether a fetch is needed.

/// Direction of travel along the chain.
///
/// `Up` walks toward masters (lower coordinates), `Down` toward apprentices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    /// Coordinate delta of one hop in this direction.
    pub fn delta(self) -> i64 {
        match self {
            Direction::Up => -1,
            Direction::Down => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorldRef {
    pub id: i64,
    pub name: String,
}

/// Reference to a neighboring record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NeighborRef {
    /// The chain terminates in this direction.
    Absent,
    /// A neighbor exists but has not been fetched.
    Unresolved { locator: String, id: i64 },
}

impl NeighborRef {
    pub fn is_absent(&self) -> bool {
        matches!(self, NeighborRef::Absent)
    }
}

/// One record of the chain. Immutable once decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainNode {
    pub id: i64,
    pub name: String,
    pub homeworld: WorldRef,
    pub master: NeighborRef,
    pub apprentice: NeighborRef,
}

impl ChainNode {
    /// The neighbor one hop away: master for `Up`, apprentice for `Down`.
    pub fn neighbor(&self, direction: Direction) -> &NeighborRef {
        match direction {
            Direction::Up => &self.master,
            Direction::Down => &self.apprentice,
        }
    }

    /// True when this record's homeworld is `location`.
    pub fn is_on(&self, location: Option<&WorldRef>) -> bool {
        location.is_some_and(|w| w.id == self.homeworld.id)
    }
}
