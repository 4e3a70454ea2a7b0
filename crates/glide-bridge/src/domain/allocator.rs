//! Correlation id allocation.
//!
//! Ids come from a wrapping `u64` counter. With [`IdReusePolicy::Recycle`],
//! ids handed back through [`IndexAllocator::release`] are reissued first.
//! Callers must only release an id after its table entry has been removed
//! and the operation settled; the table additionally refuses to reissue an
//! id that is still live, which also covers counter wraparound.

use crate::domain::correlation::CorrelationId;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Id reuse policy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdReusePolicy {
    /// Never reuse; the counter only grows (wrapping at `u64::MAX`).
    #[default]
    Monotonic,
    /// Reuse ids released after confirmed removal.
    Recycle,
}

/// Issues correlation ids.
#[derive(Debug)]
pub struct IndexAllocator {
    next: AtomicU64,
    policy: IdReusePolicy,
    free: Mutex<Vec<u64>>,
}

impl IndexAllocator {
    pub fn new(policy: IdReusePolicy) -> Self {
        Self::starting_at(policy, 0)
    }

    /// Allocator whose counter starts at `next`.
    pub fn starting_at(policy: IdReusePolicy, next: u64) -> Self {
        Self {
            next: AtomicU64::new(next),
            policy,
            free: Mutex::new(Vec::new()),
        }
    }

    pub fn policy(&self) -> IdReusePolicy {
        self.policy
    }

    /// Next candidate id. Uniqueness among live ids is checked by the table.
    pub fn allocate(&self) -> CorrelationId {
        if self.policy == IdReusePolicy::Recycle {
            if let Some(raw) = self.free.lock().pop() {
                return CorrelationId::new(raw);
            }
        }
        // fetch_add wraps on overflow
        CorrelationId::new(self.next.fetch_add(1, Ordering::Relaxed))
    }

    /// Return an id whose table entry is gone. No-op under `Monotonic`.
    pub fn release(&self, id: CorrelationId) {
        if self.policy == IdReusePolicy::Recycle {
            self.free.lock().push(id.raw());
        }
    }

    /// Number of ids waiting to be reissued.
    pub fn recyclable(&self) -> usize {
        self.free.lock().len()
    }
}

impl Default for IndexAllocator {
    fn default() -> Self {
        Self::new(IdReusePolicy::default())
    }
}
