#![no_main]

use std::collections::BTreeMap;

use libfuzzer_sys::fuzz_target;
use holocron::chain::{ChainNode, NeighborRef, WorldRef};
use holocron::state::{Action, CoreState, Intent};
use holocron::tracker::RequestId;
use holocron::transport::FetchError;

const FIRST: i64 = -40;
const LAST: i64 = 40;

fn link(id: i64) -> NeighborRef {
    NeighborRef::Unresolved {
        locator: format!("fuzz://{id}"),
        id,
    }
}

fn record(id: i64) -> ChainNode {
    ChainNode {
        id,
        name: String::new(),
        homeworld: WorldRef { id: 0, name: String::new() },
        master: if id > FIRST { link(id - 1) } else { NeighborRef::Absent },
        apprentice: if id < LAST { link(id + 1) } else { NeighborRef::Absent },
    }
}

fn record_intents(intents: Vec<Intent>, issued: &mut BTreeMap<RequestId, i64>) {
    for intent in intents {
        if let Intent::Fetch { request, coordinate, .. } = intent {
            issued.insert(request, coordinate);
        }
    }
}

// Each input byte is one action:
//   low 2 bits  : 0 = up, 1 = down, 2 = complete ok, 3 = complete failed
//   high 6 bits : which in-flight (or already cancelled) request to complete
fuzz_target!(|data: &[u8]| {
    let Some((&shape, ops)) = data.split_first() else {
        return;
    };
    let rows = 2 + (shape & 0x7) as usize;
    let speed = 1 + ((shape >> 3) as usize % (rows - 1));
    let mut core = CoreState::new(rows, speed);

    let mut issued: BTreeMap<RequestId, i64> = BTreeMap::new();
    let center = core.seed_coordinate();
    record_intents(core.seed(&link(center)), &mut issued);

    for &op in ops {
        let intents = match op & 0x3 {
            0 => core.dispatch(Action::ScrollUp),
            1 => core.dispatch(Action::ScrollDown),
            kind => {
                if issued.is_empty() {
                    continue;
                }
                let pick = (op >> 2) as usize % issued.len();
                let Some((&request, &coordinate)) = issued.iter().nth(pick) else {
                    continue;
                };
                // Keep the id around: delivering it twice must be harmless.
                let outcome = if kind == 2 {
                    Ok(record(coordinate))
                } else {
                    Err(FetchError::Transport("fuzz".into()))
                };
                core.dispatch(Action::FetchCompleted { request, outcome })
            }
        };
        record_intents(intents, &mut issued);

        assert_eq!(core.current_window().len(), rows);
        for (i, slot) in core.current_window().iter().enumerate() {
            if let Some(node) = slot {
                assert_eq!(node.id, core.cursor() + i as i64);
            }
        }
        let window = core.cursor()..core.cursor() + rows as i64;
        for &coordinate in issued.values() {
            if core.is_pending(coordinate) {
                assert!(window.contains(&coordinate));
            }
        }
        assert!(core.pending_count() <= rows);
    }
});
