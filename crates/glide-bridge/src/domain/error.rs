//! Bridge error types.
//!
//! Every error is delivered on the completion sink of the one operation it
//! concerns, except `ConstructionFailure` (returned from connect) and
//! `DroppedCallback` (logged, never surfaced to a caller).

use crate::domain::correlation::CorrelationId;
use crate::domain::request_type::RequestType;
use serde::{Deserialize, Serialize};

/// Error categories the native engine may attach to a failure.
///
/// Numbering is the engine's FFI error-type enum.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NativeErrorKind {
    Closing = 0,
    Request = 1,
    Timeout = 2,
    ExecAbort = 3,
    Connection = 4,
}

impl NativeErrorKind {
    pub fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(Self::Closing),
            1 => Some(Self::Request),
            2 => Some(Self::Timeout),
            3 => Some(Self::ExecAbort),
            4 => Some(Self::Connection),
            _ => None,
        }
    }
}

/// Message used when the engine reports a failure without detail.
pub const GENERIC_FAILURE_MESSAGE: &str = "operation failed";

/// Errors surfaced by the bridge.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BridgeError {
    /// Native handle creation failed, or the client could not be set up.
    #[error("failed to create client: {0}")]
    ConstructionFailure(String),

    /// The engine reported failure for this operation.
    #[error("operation {id} failed: {message}")]
    OperationFailure {
        id: CorrelationId,
        kind: Option<NativeErrorKind>,
        message: String,
    },

    /// The client was closed before or while this operation was in flight.
    #[error("client closed")]
    ClientClosed,

    /// The tag cannot be submitted to the engine.
    #[error("request type {0:?} cannot be dispatched")]
    InvalidRequest(RequestType),

    /// A callback referenced an id with no pending operation.
    #[error("callback for unknown correlation id {id}")]
    DroppedCallback { id: CorrelationId },
}

impl BridgeError {
    /// Failure reported through the plain failure callback.
    pub fn operation_failed(id: CorrelationId) -> Self {
        Self::OperationFailure {
            id,
            kind: None,
            message: GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }

    /// Failure reported with an engine error category and message.
    pub fn native(id: CorrelationId, kind: Option<NativeErrorKind>, message: impl Into<String>) -> Self {
        let message = message.into();
        Self::OperationFailure {
            id,
            kind,
            message: if message.is_empty() {
                GENERIC_FAILURE_MESSAGE.to_string()
            } else {
                message
            },
        }
    }

    pub fn is_client_closed(&self) -> bool {
        matches!(self, Self::ClientClosed)
    }
}

/// Result type for bridge operations
pub type BridgeResult<T> = Result<T, BridgeError>;
