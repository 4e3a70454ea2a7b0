//! Request Dispatcher.
//!
//! Registers the pending operation before the engine can possibly answer,
//! marshals the arguments and submits. Never waits for completion; the
//! returned [`PendingReply`] is the only suspension point.

use crate::domain::{
    ArgumentBuffer, ArgumentRetention, BridgeError, BridgeResult, CorrelationId, CorrelationTable,
    PendingOperation, Reply, RequestType,
};
use crate::ports::{NativeEngine, NativeHandle};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::oneshot;
use tracing::trace;

/// Awaitable completion of one dispatched operation.
///
/// Dropping it does not cancel the native work; the operation stays in the
/// table until the engine answers or the client closes.
#[derive(Debug)]
#[must_use = "the reply is only observable by awaiting it"]
pub struct PendingReply {
    id: CorrelationId,
    receiver: oneshot::Receiver<BridgeResult<Reply>>,
}

impl PendingReply {
    pub fn id(&self) -> CorrelationId {
        self.id
    }
}

impl Future for PendingReply {
    type Output = BridgeResult<Reply>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        // A sink dropped unsettled means the resolver went away with its runtime.
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|settled| settled.unwrap_or(Err(BridgeError::ClientClosed)))
    }
}

/// Turns (tag, args) into a registered, submitted operation.
pub struct RequestDispatcher {
    engine: Arc<dyn NativeEngine>,
    table: Arc<CorrelationTable>,
    retention: ArgumentRetention,
}

impl RequestDispatcher {
    pub fn new(engine: Arc<dyn NativeEngine>, table: Arc<CorrelationTable>) -> Self {
        let retention = engine.argument_retention();
        Self {
            engine,
            table,
            retention,
        }
    }

    /// Register and submit one operation against `handle`.
    ///
    /// The caller guarantees `handle` is open for the whole call.
    pub fn dispatch<I, A>(
        &self,
        handle: &NativeHandle,
        request_type: RequestType,
        args: I,
    ) -> BridgeResult<PendingReply>
    where
        I: IntoIterator<Item = A>,
        A: AsRef<[u8]>,
    {
        if !request_type.is_submittable() {
            return Err(BridgeError::InvalidRequest(request_type));
        }

        let buffer = Arc::new(ArgumentBuffer::marshal(args));
        let retained = match self.retention {
            ArgumentRetention::UntilCompletion => Some(Arc::clone(&buffer)),
            ArgumentRetention::CopiedOnSubmit => None,
        };

        let (sink, receiver) = oneshot::channel();
        let id = self
            .table
            .insert(PendingOperation::new(request_type, sink, retained));

        trace!(
            correlation_id = %id,
            request_type = ?request_type,
            args = buffer.len(),
            bytes = buffer.byte_len(),
            "Submitting operation"
        );
        self.engine.submit(handle, id, request_type, &buffer);
        // `buffer` dropped here; a retained copy lives on in the operation.

        Ok(PendingReply { id, receiver })
    }

    pub fn retention(&self) -> ArgumentRetention {
        self.retention
    }
}

impl std::fmt::Debug for RequestDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestDispatcher")
            .field("retention", &self.retention)
            .finish()
    }
}
