//! Correlation ID for matching native completions to pending operations.
//!
//! The native engine only ever sees the raw `u64`; it hands the same value
//! back to the success/failure callbacks.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Correlation ID identifying one in-flight operation.
///
/// Issued by the [`IndexAllocator`](crate::domain::allocator::IndexAllocator)
/// and unique among live entries of a single client's correlation table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(u64);

impl CorrelationId {
    /// Wrap a raw id (as received from the native side).
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw value passed across the boundary.
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for CorrelationId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl From<CorrelationId> for u64 {
    fn from(id: CorrelationId) -> Self {
        id.0
    }
}
