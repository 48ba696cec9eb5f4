use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use holocron::chain::{ChainNode, Direction, NeighborRef, WorldRef};
use holocron::scheduler::{Scheduler, drain_until_idle};
use holocron::state::{Action, CoreState, Intent};
use holocron::tracker::RequestId;
use holocron::transport::{FetchError, Fetcher};
use holocron::wire;
use proptest::prelude::*;
use proptest::sample::Index;

const ROWS: usize = 5;
const SPEED: usize = 2;

fn locator(id: i64) -> String {
    format!("http://chain.invalid/dark-jedis/{id}")
}

fn link(id: i64) -> NeighborRef {
    NeighborRef::Unresolved {
        locator: locator(id),
        id,
    }
}

/// Record `id` of a straight chain spanning `[first, last]`.
fn record(id: i64, first: i64, last: i64) -> ChainNode {
    ChainNode {
        id,
        name: format!("Lord {id}"),
        homeworld: WorldRef {
            id: id % 3,
            name: format!("World {}", id % 3),
        },
        master: if id > first { link(id - 1) } else { NeighborRef::Absent },
        apprentice: if id < last { link(id + 1) } else { NeighborRef::Absent },
    }
}

fn node(id: i64) -> ChainNode {
    record(id, i64::MIN, i64::MAX)
}

/// Pending fetches keyed by coordinate, cancels as a set of coordinates.
#[derive(Default)]
struct Effects {
    fetches: BTreeMap<i64, RequestId>,
    cancels: BTreeSet<i64>,
}

fn effects(intents: &[Intent]) -> Effects {
    let mut out = Effects::default();
    for intent in intents {
        match intent {
            Intent::Fetch {
                request,
                coordinate,
                ..
            } => {
                out.fetches.insert(*coordinate, *request);
            }
            Intent::Cancel { coordinate, .. } => {
                out.cancels.insert(*coordinate);
            }
        }
    }
    out
}

fn complete(core: &mut CoreState, request: RequestId, outcome: Result<ChainNode, FetchError>) -> Effects {
    effects(&core.dispatch(Action::FetchCompleted { request, outcome }))
}

fn ids(core: &CoreState) -> Vec<Option<i64>> {
    core.current_window()
        .iter()
        .map(|s| s.as_ref().map(|n| n.id))
        .collect()
}

/// Seed at the center and load it. Returns the frontier fetches (1 and 3).
fn seeded() -> (CoreState, Effects) {
    let mut core = CoreState::new(ROWS, SPEED);
    let seed = effects(&core.seed(&link(2)));
    let request = seed.fetches[&2];
    let frontier = complete(&mut core, request, Ok(node(2)));
    (core, frontier)
}

#[test]
fn test_end_to_end_out_of_order_completion_and_scroll() {
    let (mut core, frontier) = seeded();
    assert_eq!(frontier.fetches.keys().copied().collect::<Vec<_>>(), vec![1, 3]);

    // 3 completes before 1
    let after3 = complete(&mut core, frontier.fetches[&3], Ok(node(3)));
    assert_eq!(ids(&core), vec![None, None, Some(2), Some(3), None]);
    assert_eq!(after3.fetches.keys().copied().collect::<Vec<_>>(), vec![4]);

    let after1 = complete(&mut core, frontier.fetches[&1], Ok(node(1)));
    assert_eq!(ids(&core), vec![None, Some(1), Some(2), Some(3), None]);
    assert_eq!(after1.fetches.keys().copied().collect::<Vec<_>>(), vec![0]);

    assert!(core.can_scroll(Direction::Down));
    let scrolled = effects(&core.dispatch(Action::ScrollDown));
    assert_eq!(core.cursor(), 2);
    assert_eq!(ids(&core), vec![Some(2), Some(3), None, None, None]);
    // request for 0 fell out of view; 4 is still in flight
    assert_eq!(scrolled.cancels, BTreeSet::from([0]));
    assert!(scrolled.fetches.is_empty());
    assert!(core.is_pending(4));
    assert!(!core.is_pending(0));

    // late completion of the cancelled request is ignored
    let late = complete(&mut core, after1.fetches[&0], Ok(node(0)));
    assert!(late.fetches.is_empty());
    assert_eq!(ids(&core), vec![Some(2), Some(3), None, None, None]);

    // 4 was issued at cursor 0 and lands at slot 4 - 2
    let after4 = complete(&mut core, after3.fetches[&4], Ok(node(4)));
    assert_eq!(ids(&core), vec![Some(2), Some(3), Some(4), None, None]);
    assert_eq!(after4.fetches.keys().copied().collect::<Vec<_>>(), vec![5]);
}

#[test]
fn test_duplicate_completion_applies_once() {
    let (mut core, frontier) = seeded();
    let first = complete(&mut core, frontier.fetches[&3], Ok(node(3)));
    assert_eq!(first.fetches.len(), 1);
    let pending = core.pending_count();

    let second = complete(&mut core, frontier.fetches[&3], Ok(node(3)));
    assert!(second.fetches.is_empty());
    assert_eq!(core.pending_count(), pending);
    assert_eq!(ids(&core), vec![None, None, Some(2), Some(3), None]);
}

#[test]
fn test_placement_uses_cursor_at_completion() {
    let (mut core, frontier) = seeded();
    let after3 = complete(&mut core, frontier.fetches[&3], Ok(node(3)));
    // scroll up while 1 and 4 are in flight: 1 stays in view, 4 leaves
    let up = effects(&core.dispatch(Action::ScrollUp));
    assert_eq!(core.cursor(), -2);
    assert_eq!(up.cancels, BTreeSet::from([4]));
    assert!(core.is_pending(1));

    complete(&mut core, frontier.fetches[&1], Ok(node(1)));
    // coordinate 1 is slot 3 now
    assert_eq!(ids(&core), vec![None, None, None, Some(1), Some(2)]);

    let late = complete(&mut core, after3.fetches[&4], Ok(node(4)));
    assert!(late.fetches.is_empty());
    assert_eq!(ids(&core), vec![None, None, None, Some(1), Some(2)]);
}

#[test]
fn test_failed_slot_is_refetched_when_revisited() {
    let (mut core, frontier) = seeded();
    let failed = complete(&mut core, frontier.fetches[&3], Err(FetchError::Status(500)));
    assert!(failed.fetches.is_empty());
    assert_eq!(ids(&core)[3], None);
    assert!(!core.is_pending(3));

    complete(&mut core, frontier.fetches[&1], Ok(node(1)));
    assert_eq!(ids(&core), vec![None, Some(1), Some(2), None, None]);

    let scrolled = effects(&core.dispatch(Action::ScrollDown));
    assert_eq!(core.cursor(), 2);
    let retry = scrolled.fetches[&3];
    assert_ne!(retry, frontier.fetches[&3]);

    complete(&mut core, retry, Ok(node(3)));
    assert_eq!(ids(&core)[..2], [Some(2), Some(3)]);
}

#[test]
fn test_chain_ends_block_scrolling() {
    let mut core = CoreState::new(ROWS, SPEED);
    let seed = effects(&core.seed(&link(2)));
    let frontier = complete(&mut core, seed.fetches[&2], Ok(record(2, 2, 3)));
    // 2 has no master
    assert_eq!(frontier.fetches.keys().copied().collect::<Vec<_>>(), vec![3]);
    complete(&mut core, frontier.fetches[&3], Ok(record(3, 2, 3)));

    assert!(!core.can_scroll(Direction::Up));
    assert!(!core.can_scroll(Direction::Down));
    assert!(core.dispatch(Action::ScrollUp).is_empty());
    assert!(core.dispatch(Action::ScrollDown).is_empty());
    assert_eq!(core.cursor(), 0);
    assert_eq!(core.pending_count(), 0);
}

#[derive(Debug, Clone)]
enum Step {
    ScrollUp,
    ScrollDown,
    CompleteOk(Index),
    CompleteFailed(Index),
    /// Deliver a completion for a request that was already cancelled.
    ReplayCancelled(Index),
}

fn arb_step() -> impl Strategy<Value = Step> {
    prop_oneof![
        2 => Just(Step::ScrollUp),
        2 => Just(Step::ScrollDown),
        4 => any::<Index>().prop_map(Step::CompleteOk),
        1 => any::<Index>().prop_map(Step::CompleteFailed),
        1 => any::<Index>().prop_map(Step::ReplayCancelled),
    ]
}

fn check_interleaving(steps: &[Step]) {
    const FIRST: i64 = -15;
    const LAST: i64 = 25;

    let mut core = CoreState::new(ROWS, SPEED);
    let mut in_flight: Vec<(RequestId, i64)> = Vec::new();
    let mut pruned: Vec<RequestId> = Vec::new();

    let seed_fx = core.seed(&link(2));
    in_flight.extend(effects(&seed_fx).fetches.into_iter().map(|(c, r)| (r, c)));

    for step in steps {
        let old_cursor = core.cursor();
        let intents = match step {
            Step::ScrollUp => core.dispatch(Action::ScrollUp),
            Step::ScrollDown => core.dispatch(Action::ScrollDown),
            Step::ReplayCancelled(pick) if !pruned.is_empty() => {
                let request = pruned.swap_remove(pick.index(pruned.len()));
                let before = ids(&core);
                let fx = core.dispatch(Action::FetchCompleted {
                    request,
                    outcome: Ok(record(0, FIRST, LAST)),
                });
                assert!(fx.is_empty());
                assert_eq!(ids(&core), before);
                fx
            }
            Step::CompleteOk(pick) | Step::CompleteFailed(pick) if !in_flight.is_empty() => {
                let (request, coordinate) = in_flight.swap_remove(pick.index(in_flight.len()));
                let outcome = match step {
                    Step::CompleteFailed(_) => Err(FetchError::Transport("reset".into())),
                    _ => Ok(record(coordinate, FIRST, LAST)),
                };
                core.dispatch(Action::FetchCompleted { request, outcome })
            }
            _ => vec![],
        };

        for intent in &intents {
            match intent {
                Intent::Fetch {
                    request,
                    coordinate,
                    ..
                } => {
                    assert!((FIRST..=LAST).contains(coordinate));
                    in_flight.push((*request, *coordinate));
                }
                Intent::Cancel {
                    request,
                    coordinate,
                    ..
                } => {
                    assert_ne!(core.cursor(), old_cursor, "cancel without a scroll");
                    let slot = coordinate - core.cursor();
                    assert!(!(0..ROWS as i64).contains(&slot));
                    in_flight.retain(|(r, _)| r != request);
                    pruned.push(*request);
                }
            }
        }

        assert_eq!(core.current_window().len(), ROWS);
        for (i, slot) in core.current_window().iter().enumerate() {
            if let Some(n) = slot {
                assert_eq!(n.id, core.cursor() + i as i64);
            }
        }
        let coords: BTreeSet<i64> = in_flight.iter().map(|(_, c)| *c).collect();
        assert_eq!(coords.len(), in_flight.len(), "duplicate request for a coordinate");
        assert_eq!(core.pending_count(), in_flight.len());
        for c in coords {
            assert!(core.is_pending(c));
            assert!((0..ROWS as i64).contains(&(c - core.cursor())));
        }
    }
}

proptest! {
    #[test]
    fn test_random_interleaving_keeps_invariants(
        steps in prop::collection::vec(arb_step(), 0..300)
    ) {
        check_interleaving(&steps);
    }
}

// ---------------------------------------------------------------------------
// Scheduler + decoder
// ---------------------------------------------------------------------------

/// Serves JSON bodies for a straight chain `[first, last]`.
struct JsonChain {
    first: i64,
    last: i64,
}

impl JsonChain {
    fn body(&self, id: i64) -> String {
        let neighbor = |other: i64, present: bool| {
            if present {
                format!(r#"{{ "id": {other}, "url": "{}" }}"#, locator(other))
            } else {
                r#"{ "id": null, "url": null }"#.to_string()
            }
        };
        format!(
            r#"{{ "id": {id}, "name": "Lord {id}", "homeworld": {{ "id": {w}, "name": "World {w}" }},
                 "master": {}, "apprentice": {} }}"#,
            neighbor(id - 1, id > self.first),
            neighbor(id + 1, id < self.last),
            w = id % 3,
        )
    }
}

impl Fetcher for JsonChain {
    fn fetch(&self, locator: &str) -> Result<ChainNode, FetchError> {
        let id: i64 = locator
            .rsplit('/')
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or(FetchError::Status(404))?;
        if !(self.first..=self.last).contains(&id) {
            return Err(FetchError::Status(404));
        }
        wire::decode(&self.body(id))
    }
}

#[test]
fn test_scheduler_fills_window_from_seed() {
    let _ = env_logger::try_init();
    let (scheduler, rx) = Scheduler::new(Arc::new(JsonChain { first: -100, last: 100 }));
    let mut core = CoreState::new(ROWS, SPEED);
    scheduler.execute(core.seed(&link(2)));

    assert!(drain_until_idle(&mut core, &scheduler, &rx, Duration::from_secs(10)));
    assert_eq!(ids(&core), vec![Some(0), Some(1), Some(2), Some(3), Some(4)]);

    // scrolling exposes new rows, which the scheduler fills in
    scheduler.execute(core.dispatch(Action::ScrollDown));
    assert!(drain_until_idle(&mut core, &scheduler, &rx, Duration::from_secs(10)));
    assert_eq!(ids(&core), vec![Some(2), Some(3), Some(4), Some(5), Some(6)]);
}

#[test]
fn test_scheduler_stops_at_chain_end() {
    let (scheduler, rx) = Scheduler::new(Arc::new(JsonChain { first: 1, last: 3 }));
    let mut core = CoreState::new(ROWS, SPEED);
    scheduler.execute(core.seed(&link(2)));

    assert!(drain_until_idle(&mut core, &scheduler, &rx, Duration::from_secs(10)));
    assert_eq!(ids(&core), vec![None, Some(1), Some(2), Some(3), None]);
    assert!(!core.can_scroll(Direction::Up));
    assert!(!core.can_scroll(Direction::Down));
}
