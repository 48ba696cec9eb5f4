//! Fetch transport: HTTP GET of one record on a background thread.
//!
//! Each fetch runs on its own thread and reports back through an
//! `mpsc::Sender<Completion>`, which the main loop drains with `try_recv()`.
//! Cancellation is best effort: the thread checks its [`CancelHandle`]
//! before issuing the request and again before delivering the result.

use std::sync::Arc;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, trace};
use thiserror::Error;

use crate::chain::ChainNode;
use crate::fetch::FetchOutcome;
use crate::tracker::{CancelHandle, RequestId};
use crate::wire;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("server returned HTTP {0}")]
    Status(u16),
    #[error("malformed record: {0}")]
    Decode(String),
}

impl From<ureq::Error> for FetchError {
    fn from(e: ureq::Error) -> Self {
        match e {
            ureq::Error::StatusCode(code) => FetchError::Status(code),
            other => FetchError::Transport(other.to_string()),
        }
    }
}

/// Something that can resolve a locator to a record.
pub trait Fetcher: Send + Sync {
    fn fetch(&self, locator: &str) -> Result<ChainNode, FetchError>;
}

pub struct HttpFetcher {
    agent: ureq::Agent,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        Self { agent }
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, locator: &str) -> Result<ChainNode, FetchError> {
        let mut response = self.agent.get(locator).call()?;
        let body = response.body_mut().read_to_string()?;
        wire::decode(&body)
    }
}

/// A finished fetch, tagged with the id it was issued under.
#[derive(Debug)]
pub struct Completion {
    pub request: RequestId,
    pub outcome: FetchOutcome,
}

/// Run one fetch on a background thread.
///
/// Nothing is sent if the handle was tripped before the request starts or
/// while it was in flight.
pub fn spawn_fetch(
    fetcher: Arc<dyn Fetcher>,
    request: RequestId,
    locator: String,
    cancel: CancelHandle,
    tx: mpsc::Sender<Completion>,
) {
    thread::spawn(move || {
        if cancel.is_cancelled() {
            trace!("transport: {request} cancelled before start");
            return;
        }
        let start = Instant::now();
        let outcome = fetcher.fetch(&locator);
        if cancel.is_cancelled() {
            debug!(
                "transport: {request} cancelled in flight, dropping result after {:.1}ms",
                start.elapsed().as_secs_f64() * 1000.0
            );
            return;
        }
        debug!(
            "transport: {request} {} in {:.1}ms ({locator})",
            if outcome.is_ok() { "done" } else { "failed" },
            start.elapsed().as_secs_f64() * 1000.0
        );
        // Receiver gone means the viewer is shutting down.
        let _ = tx.send(Completion { request, outcome });
    });
}
