//! Outbound (driven) ports: the native engine as seen by the bridge.

use crate::domain::{ArgumentBuffer, ArgumentRetention, ConnectionConfig, CorrelationId, RequestType};
use crate::ports::inbound::CompletionSink;
use std::ffi::c_void;
use std::num::NonZeroUsize;
use std::sync::Arc;

/// Opaque reference to a live native engine instance.
///
/// Never null. Not `Clone`: the lifecycle manager holds the only copy and
/// gives it up by value to [`NativeEngine::close_handle`].
#[derive(Debug, PartialEq, Eq)]
pub struct NativeHandle(NonZeroUsize);

impl NativeHandle {
    /// `None` for a null handle.
    pub fn from_raw(raw: usize) -> Option<Self> {
        NonZeroUsize::new(raw).map(Self)
    }

    pub fn from_ptr(ptr: *const c_void) -> Option<Self> {
        Self::from_raw(ptr as usize)
    }

    pub fn as_raw(&self) -> usize {
        self.0.get()
    }

    pub fn as_ptr(&self) -> *const c_void {
        self.0.get() as *const c_void
    }
}

/// Native asynchronous command engine.
///
/// Contract:
/// - `create_handle` returns `None` on failure and then holds no reference
///   to `callbacks`.
/// - After `submit`, the engine eventually invokes exactly one callback for
///   `id`, unless the handle is closed first.
/// - `close_handle` is called at most once per handle. When it returns, no
///   further callbacks for that handle will run and `callbacks` has been
///   released. Retained argument buffers of unanswered operations stay
///   valid until it returns. It may block.
pub trait NativeEngine: Send + Sync + 'static {
    fn create_handle(
        &self,
        config: &ConnectionConfig,
        callbacks: Arc<dyn CompletionSink>,
    ) -> Option<NativeHandle>;

    /// Queue an operation. Must not block on its completion.
    fn submit(
        &self,
        handle: &NativeHandle,
        id: CorrelationId,
        request_type: RequestType,
        args: &Arc<ArgumentBuffer>,
    );

    fn close_handle(&self, handle: NativeHandle);

    /// How long argument memory must outlive `submit`.
    fn argument_retention(&self) -> ArgumentRetention {
        ArgumentRetention::CopiedOnSubmit
    }
}
