//! In-flight fetch bookkeeping.
//!
//! Every outstanding fetch is keyed by a unique [`RequestId`]. A completion
//! whose id is no longer tracked (pruned, or already delivered) is stale and
//! must be discarded by the caller.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Best-effort abort flag shared between the tracker and the transport.
///
/// Tripping it never blocks. The transport checks it before and after the
/// request; a completion that still arrives is discarded by id lookup.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[derive(Debug, Clone)]
pub struct PendingRequest {
    pub id: RequestId,
    /// Absolute chain coordinate; never changes after issue.
    pub target: i64,
    /// Window cursor when the request was issued.
    pub issued_at_cursor: i64,
    pub cancel: CancelHandle,
}

#[derive(Debug, Default)]
pub struct RequestTracker {
    pending: BTreeMap<RequestId, PendingRequest>,
    next_id: u64,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// True when some request already targets `coordinate`.
    pub fn targets(&self, coordinate: i64) -> bool {
        self.pending.values().any(|r| r.target == coordinate)
    }

    pub fn get(&self, id: RequestId) -> Option<&PendingRequest> {
        self.pending.get(&id)
    }

    /// Record a new request for `coordinate` issued at `cursor`.
    pub fn issue(&mut self, coordinate: i64, cursor: i64) -> (RequestId, CancelHandle) {
        self.next_id += 1;
        let id = RequestId(self.next_id);
        let cancel = CancelHandle::new();
        debug!("tracker: issue {id} for coordinate {coordinate} (cursor={cursor})");
        self.pending.insert(
            id,
            PendingRequest {
                id,
                target: coordinate,
                issued_at_cursor: cursor,
                cancel: cancel.clone(),
            },
        );
        (id, cancel)
    }

    /// Remove and return the request `id`. `None` means the completion is stale.
    pub fn take(&mut self, id: RequestId) -> Option<PendingRequest> {
        self.pending.remove(&id)
    }

    /// Remove every request whose target falls outside `[cursor, cursor + rows)`.
    ///
    /// Returned requests have not been cancelled yet; the caller trips their
    /// handles (or hands them to the scheduler).
    pub fn prune(&mut self, cursor: i64, rows: usize) -> Vec<PendingRequest> {
        let stale: Vec<RequestId> = self
            .pending
            .values()
            .filter(|r| {
                let slot = r.target - cursor;
                slot < 0 || slot >= rows as i64
            })
            .map(|r| r.id)
            .collect();
        let pruned: Vec<PendingRequest> = stale
            .into_iter()
            .filter_map(|id| self.pending.remove(&id))
            .collect();
        for r in &pruned {
            debug!(
                "tracker: prune {} (coordinate {}, issued at cursor {}, now {cursor})",
                r.id, r.target, r.issued_at_cursor
            );
        }
        pruned
    }
}
