//! Scriptable engine for tests.
//!
//! `RecordingEngine` never answers on its own: it records every submission
//! and lets the test deliver callbacks by hand through the sink it was
//! given at handle creation.

use crate::domain::{
    ArgumentBuffer, ArgumentRetention, ConnectionConfig, CorrelationId, NativeErrorKind,
    RequestType,
};
use crate::ports::{CompletionSink, NativeEngine, NativeHandle};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

/// One call to `submit`, as the engine saw it.
#[derive(Debug, Clone)]
pub struct Submission {
    pub handle: usize,
    pub id: CorrelationId,
    pub request_type: RequestType,
    pub args: Vec<Vec<u8>>,
    buffer: Weak<ArgumentBuffer>,
}

impl Submission {
    /// Whether the argument memory is still held by anyone.
    pub fn buffer_alive(&self) -> bool {
        self.buffer.strong_count() > 0
    }
}

pub struct RecordingEngine {
    retention: ArgumentRetention,
    refuse: bool,
    /// Answer every submission from inside `submit` with this payload.
    inline_reply: Option<Option<Vec<u8>>>,
    sink: Mutex<Option<Arc<dyn CompletionSink>>>,
    submissions: Mutex<Vec<Submission>>,
    configs: Mutex<Vec<ConnectionConfig>>,
    /// Argument buffers still alive when `close_handle` ran.
    live_at_close: Mutex<Option<usize>>,
    creates: AtomicUsize,
    closes: AtomicUsize,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self::build(ArgumentRetention::CopiedOnSubmit, false, None)
    }

    pub fn with_retention(retention: ArgumentRetention) -> Self {
        Self::build(retention, false, None)
    }

    /// Engine whose `create_handle` always returns null.
    pub fn refusing() -> Self {
        Self::build(ArgumentRetention::CopiedOnSubmit, true, None)
    }

    pub fn answering_inline(reply: Option<&[u8]>) -> Self {
        Self::build(
            ArgumentRetention::CopiedOnSubmit,
            false,
            Some(reply.map(<[u8]>::to_vec)),
        )
    }

    fn build(retention: ArgumentRetention, refuse: bool, inline_reply: Option<Option<Vec<u8>>>) -> Self {
        Self {
            retention,
            refuse,
            inline_reply,
            sink: Mutex::new(None),
            submissions: Mutex::new(Vec::new()),
            configs: Mutex::new(Vec::new()),
            live_at_close: Mutex::new(None),
            creates: AtomicUsize::new(0),
            closes: AtomicUsize::new(0),
        }
    }

    pub fn submissions(&self) -> Vec<Submission> {
        self.submissions.lock().clone()
    }

    /// Configs received by `create_handle`, in order.
    pub fn configs(&self) -> Vec<ConnectionConfig> {
        self.configs.lock().clone()
    }

    /// Submitted argument buffers that were still readable from inside
    /// `close_handle`. `None` until the handle is closed.
    pub fn live_buffers_at_close(&self) -> Option<usize> {
        *self.live_at_close.lock()
    }

    /// Sink registered by the open handle, `None` once closed.
    pub fn sink(&self) -> Option<Arc<dyn CompletionSink>> {
        self.sink.lock().clone()
    }

    pub fn complete(&self, id: CorrelationId, result: Option<&[u8]>) {
        if let Some(sink) = self.sink() {
            sink.on_success(id, result);
        }
    }

    pub fn fail(&self, id: CorrelationId) {
        if let Some(sink) = self.sink() {
            sink.on_failure(id);
        }
    }

    pub fn error(&self, id: CorrelationId, kind: NativeErrorKind, message: &str) {
        if let Some(sink) = self.sink() {
            sink.on_error(id, Some(kind), message);
        }
    }

    pub fn create_count(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

impl Default for RecordingEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl NativeEngine for RecordingEngine {
    fn create_handle(
        &self,
        config: &ConnectionConfig,
        callbacks: Arc<dyn CompletionSink>,
    ) -> Option<NativeHandle> {
        let n = self.creates.fetch_add(1, Ordering::SeqCst) + 1;
        self.configs.lock().push(config.clone());
        if self.refuse {
            return None;
        }
        *self.sink.lock() = Some(callbacks);
        NativeHandle::from_raw(n)
    }

    fn submit(
        &self,
        handle: &NativeHandle,
        id: CorrelationId,
        request_type: RequestType,
        args: &Arc<ArgumentBuffer>,
    ) {
        self.submissions.lock().push(Submission {
            handle: handle.as_raw(),
            id,
            request_type,
            args: args.iter().map(<[u8]>::to_vec).collect(),
            buffer: Arc::downgrade(args),
        });
        if let Some(reply) = &self.inline_reply {
            self.complete(id, reply.as_deref());
        }
    }

    fn close_handle(&self, _handle: NativeHandle) {
        self.closes.fetch_add(1, Ordering::SeqCst);
        let live = self
            .submissions
            .lock()
            .iter()
            .filter(|s| s.buffer_alive())
            .count();
        *self.live_at_close.lock() = Some(live);
        self.sink.lock().take();
    }

    fn argument_retention(&self) -> ArgumentRetention {
        self.retention
    }
}
