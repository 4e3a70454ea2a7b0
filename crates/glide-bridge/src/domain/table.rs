//! Correlation Table - maps correlation ids to operations awaiting a native completion.
//!
//! Flow:
//! 1. Dispatcher builds a [`PendingOperation`] and calls `insert()` to get its id
//! 2. Dispatcher submits the id to the native engine
//! 3. A native callback calls `lookup_and_remove()` on an engine thread
//! 4. The removed operation is settled on the caller's runtime, then its id released
//! 5. On close, `drain_all()` hands back everything still pending

use crate::domain::allocator::{IdReusePolicy, IndexAllocator};
use crate::domain::buffer::ArgumentBuffer;
use crate::domain::correlation::CorrelationId;
use crate::domain::error::{BridgeError, BridgeResult};
use crate::domain::reply::Reply;
use crate::domain::request_type::RequestType;
use bytes::Bytes;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// Single-use completion sink.
pub(crate) type CompletionSender = oneshot::Sender<BridgeResult<Reply>>;

/// An operation waiting for exactly one terminal completion.
#[derive(Debug)]
pub struct PendingOperation {
    /// Assigned on insert
    id: CorrelationId,
    request_type: RequestType,
    sink: CompletionSender,
    registered_at: Instant,
    /// Argument memory pinned until completion, for engines that read it late
    retained: Option<Arc<ArgumentBuffer>>,
}

impl PendingOperation {
    pub(crate) fn new(
        request_type: RequestType,
        sink: CompletionSender,
        retained: Option<Arc<ArgumentBuffer>>,
    ) -> Self {
        Self {
            id: CorrelationId::new(0),
            request_type,
            sink,
            registered_at: Instant::now(),
            retained,
        }
    }

    pub fn id(&self) -> CorrelationId {
        self.id
    }

    pub fn request_type(&self) -> RequestType {
        self.request_type
    }

    pub fn elapsed(&self) -> Duration {
        self.registered_at.elapsed()
    }

    pub fn retains_arguments(&self) -> bool {
        self.retained.is_some()
    }

    /// Detach the pinned argument memory so it can outlive this operation.
    ///
    /// Used at shutdown, where the engine may still read arguments until its
    /// handle is closed.
    pub(crate) fn take_retained(&mut self) -> Option<Arc<ArgumentBuffer>> {
        self.retained.take()
    }

    /// Resolve with the engine's payload. A missing payload becomes the
    /// tag's null reply.
    ///
    /// Returns false if the caller stopped waiting.
    pub(crate) fn resolve(self, payload: Option<Bytes>) -> bool {
        let reply = match payload {
            Some(data) => Reply::Data(data),
            None => self.request_type.null_reply(),
        };
        self.sink.send(Ok(reply)).is_ok()
    }

    /// Reject with `error`. Returns false if the caller stopped waiting.
    pub(crate) fn reject(self, error: BridgeError) -> bool {
        self.sink.send(Err(error)).is_ok()
    }
}

/// How an operation left the table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    Resolved,
    Rejected,
    ForceClosed,
}

/// Statistics for the correlation table
#[derive(Debug, Default)]
pub struct PendingStats {
    /// Total operations registered
    pub total_registered: AtomicU64,
    /// Total operations resolved with a reply
    pub total_completed: AtomicU64,
    /// Total operations rejected by the engine
    pub total_failed: AtomicU64,
    /// Total operations failed by client shutdown
    pub total_force_closed: AtomicU64,
    /// Total callbacks for unknown ids
    pub total_dropped_callbacks: AtomicU64,
    /// Total settlements nobody was waiting for
    pub total_abandoned: AtomicU64,
}

impl PendingStats {
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            registered: self.total_registered.load(Ordering::Relaxed),
            completed: self.total_completed.load(Ordering::Relaxed),
            failed: self.total_failed.load(Ordering::Relaxed),
            force_closed: self.total_force_closed.load(Ordering::Relaxed),
            dropped_callbacks: self.total_dropped_callbacks.load(Ordering::Relaxed),
            abandoned: self.total_abandoned.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`PendingStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub registered: u64,
    pub completed: u64,
    pub failed: u64,
    pub force_closed: u64,
    pub dropped_callbacks: u64,
    pub abandoned: u64,
}

/// Thread-safe id → operation map owned by one client.
pub struct CorrelationTable {
    pending: DashMap<CorrelationId, PendingOperation>,
    allocator: IndexAllocator,
    stats: PendingStats,
}

impl CorrelationTable {
    pub fn new(policy: IdReusePolicy) -> Self {
        Self::with_allocator(IndexAllocator::new(policy))
    }

    pub fn with_allocator(allocator: IndexAllocator) -> Self {
        Self {
            pending: DashMap::new(),
            allocator,
            stats: PendingStats::default(),
        }
    }

    /// Register `op` under a fresh id and return that id.
    ///
    /// Candidate ids that are still live (wrapped counter, double release)
    /// are skipped.
    pub fn insert(&self, mut op: PendingOperation) -> CorrelationId {
        loop {
            let id = self.allocator.allocate();
            match self.pending.entry(id) {
                Entry::Occupied(_) => {
                    warn!(correlation_id = %id, "Allocator offered a live id, skipping");
                }
                Entry::Vacant(slot) => {
                    op.id = id;
                    let request_type = op.request_type;
                    slot.insert(op);
                    self.stats.total_registered.fetch_add(1, Ordering::Relaxed);
                    debug!(
                        correlation_id = %id,
                        request_type = ?request_type,
                        "Registered pending operation"
                    );
                    return id;
                }
            }
        }
    }

    /// Remove and return the operation registered under `id`.
    ///
    /// An unknown id means a stale or duplicate callback; it is counted and
    /// reported as [`BridgeError::DroppedCallback`].
    pub fn lookup_and_remove(&self, id: CorrelationId) -> BridgeResult<PendingOperation> {
        match self.pending.remove(&id) {
            Some((_, op)) => Ok(op),
            None => {
                self.stats
                    .total_dropped_callbacks
                    .fetch_add(1, Ordering::Relaxed);
                Err(BridgeError::DroppedCallback { id })
            }
        }
    }

    /// Remove every remaining operation. Shutdown only.
    pub fn drain_all(&self) -> Vec<PendingOperation> {
        let ids: Vec<CorrelationId> = self.pending.iter().map(|entry| *entry.key()).collect();
        ids.into_iter()
            .filter_map(|id| self.pending.remove(&id).map(|(_, op)| op))
            .collect()
    }

    /// Record how a removed operation was settled and make its id reusable.
    pub fn record_settled(&self, id: CorrelationId, settlement: Settlement, delivered: bool) {
        let counter = match settlement {
            Settlement::Resolved => &self.stats.total_completed,
            Settlement::Rejected => &self.stats.total_failed,
            Settlement::ForceClosed => &self.stats.total_force_closed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        if !delivered {
            self.stats.total_abandoned.fetch_add(1, Ordering::Relaxed);
            debug!(correlation_id = %id, "Pending operation receiver dropped");
        }
        self.allocator.release(id);
    }

    /// Get number of currently pending operations
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Check if a correlation id is pending
    pub fn is_pending(&self, id: CorrelationId) -> bool {
        self.pending.contains_key(&id)
    }

    /// Get statistics
    pub fn stats(&self) -> &PendingStats {
        &self.stats
    }

    pub fn allocator(&self) -> &IndexAllocator {
        &self.allocator
    }
}

impl std::fmt::Debug for CorrelationTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CorrelationTable")
            .field("pending", &self.pending.len())
            .field("policy", &self.allocator.policy())
            .finish()
    }
}
