//! Completion Callback Router.
//!
//! The engine calls into the router on its own threads. Those threads only
//! do two things: remove the entry from the correlation table and push the
//! removed operation onto an unbounded queue. A resolver task on the
//! caller's tokio runtime drains the queue and settles each operation, so
//! no caller continuation, tag mapping or bookkeeping ever runs on an
//! engine thread.
//!
//! ```text
//!  engine thread                         caller runtime
//!  ─────────────                         ──────────────
//!  on_success(id, bytes)
//!    table.lookup_and_remove(id)  ──┐
//!    copy bytes                     │ Completion
//!    queue.send(..)  ───────────────┴──────────────▶ resolve_completions()
//!  return                                             op.resolve / op.reject
//!                                                     table.record_settled
//! ```

use crate::domain::{
    BridgeError, CorrelationId, CorrelationTable, NativeErrorKind, PendingOperation, Settlement,
};
use crate::ports::CompletionSink;
use bytes::Bytes;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

/// Terminal outcome reported by the engine.
#[derive(Debug)]
enum Outcome {
    Success(Option<Bytes>),
    Failure(BridgeError),
}

/// An operation removed from the table, waiting to be settled.
#[derive(Debug)]
struct Completion {
    op: PendingOperation,
    outcome: Outcome,
}

/// Receives native completions and hands them to the caller runtime.
pub struct CallbackRouter {
    table: Arc<CorrelationTable>,
    queue: mpsc::UnboundedSender<Completion>,
}

impl CallbackRouter {
    /// Create the router and spawn its resolver task on `runtime`.
    ///
    /// The resolver exits once the router (and every clone of the `Arc`
    /// handed to the engine) has been dropped and the queue is empty.
    pub fn start(table: Arc<CorrelationTable>, runtime: &Handle) -> Arc<Self> {
        let (queue, completions) = mpsc::unbounded_channel();
        runtime.spawn(resolve_completions(Arc::clone(&table), completions));
        Arc::new(Self { table, queue })
    }

    fn take(&self, id: CorrelationId, callback: &'static str) -> Option<PendingOperation> {
        match self.table.lookup_and_remove(id) {
            Ok(op) => Some(op),
            Err(err) => {
                warn!(correlation_id = %id, callback, error = %err, "Dropping native callback");
                None
            }
        }
    }

    fn hand_off(&self, op: PendingOperation, outcome: Outcome) {
        if let Err(mpsc::error::SendError(completion)) = self.queue.send(Completion { op, outcome }) {
            // Resolver is gone with its runtime; dropping the sink wakes the
            // caller with ClientClosed.
            warn!(
                correlation_id = %completion.op.id(),
                "Resolver stopped, abandoning completion"
            );
        }
    }
}

impl CompletionSink for CallbackRouter {
    fn on_success(&self, id: CorrelationId, result: Option<&[u8]>) {
        let Some(op) = self.take(id, "success") else {
            return;
        };
        // Native memory is only valid until this call returns.
        let payload = result.map(Bytes::copy_from_slice);
        self.hand_off(op, Outcome::Success(payload));
    }

    fn on_failure(&self, id: CorrelationId) {
        let Some(op) = self.take(id, "failure") else {
            return;
        };
        self.hand_off(op, Outcome::Failure(BridgeError::operation_failed(id)));
    }

    fn on_error(&self, id: CorrelationId, kind: Option<NativeErrorKind>, message: &str) {
        let Some(op) = self.take(id, "error") else {
            return;
        };
        self.hand_off(op, Outcome::Failure(BridgeError::native(id, kind, message)));
    }
}

impl std::fmt::Debug for CallbackRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackRouter")
            .field("table", &self.table)
            .finish()
    }
}

/// Resolver task: settles completions on the caller runtime.
async fn resolve_completions(
    table: Arc<CorrelationTable>,
    mut completions: mpsc::UnboundedReceiver<Completion>,
) {
    while let Some(Completion { op, outcome }) = completions.recv().await {
        let id = op.id();
        let request_type = op.request_type();
        let elapsed = op.elapsed();

        let (settlement, delivered) = match outcome {
            Outcome::Success(payload) => (Settlement::Resolved, op.resolve(payload)),
            Outcome::Failure(err) => {
                debug!(correlation_id = %id, error = %err, "Operation failed");
                (Settlement::Rejected, op.reject(err))
            }
        };
        table.record_settled(id, settlement, delivered);

        trace!(
            correlation_id = %id,
            request_type = ?request_type,
            elapsed_us = elapsed.as_micros() as u64,
            "Settled pending operation"
        );
    }
    debug!("Completion queue closed, resolver exiting");
}
