//! Executes core intents against the transport.
//!
//! Completions come back on the `mpsc::Receiver<Completion>` returned by
//! [`Scheduler::new`]; the caller feeds them to [`CoreState::dispatch`]
//! one at a time, which keeps all state mutation on one thread.

use std::sync::Arc;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use log::debug;

use crate::state::{Action, CoreState, Intent};
use crate::transport::{Completion, Fetcher, spawn_fetch};

pub struct Scheduler {
    fetcher: Arc<dyn Fetcher>,
    tx: mpsc::Sender<Completion>,
}

impl Scheduler {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> (Self, mpsc::Receiver<Completion>) {
        let (tx, rx) = mpsc::channel();
        (Self { fetcher, tx }, rx)
    }

    pub fn execute(&self, intents: Vec<Intent>) {
        for intent in intents {
            match intent {
                Intent::Fetch {
                    request,
                    coordinate,
                    locator,
                    cancel,
                } => {
                    debug!("scheduler: start {request} (coordinate {coordinate})");
                    spawn_fetch(
                        Arc::clone(&self.fetcher),
                        request,
                        locator,
                        cancel,
                        self.tx.clone(),
                    );
                }
                Intent::Cancel {
                    request,
                    coordinate,
                    cancel,
                } => {
                    debug!("scheduler: cancel {request} (coordinate {coordinate})");
                    cancel.cancel();
                }
            }
        }
    }

    /// Dispatch one completion and execute whatever it triggers.
    pub fn complete(&self, core: &mut CoreState, completion: Completion) {
        let intents = core.dispatch(Action::FetchCompleted {
            request: completion.request,
            outcome: completion.outcome,
        });
        self.execute(intents);
    }
}

/// Process completions until nothing is in flight or `timeout` passes.
///
/// Returns true when the core went idle.
pub fn drain_until_idle(
    core: &mut CoreState,
    scheduler: &Scheduler,
    rx: &mpsc::Receiver<Completion>,
    timeout: Duration,
) -> bool {
    let deadline = Instant::now() + timeout;
    while core.pending_count() > 0 {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match rx.recv_timeout(remaining) {
            Ok(completion) => scheduler.complete(core, completion),
            Err(_) => {
                debug!("scheduler: gave up with {} request(s) pending", core.pending_count());
                return false;
            }
        }
    }
    true
}
