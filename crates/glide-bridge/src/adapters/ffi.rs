//! C ABI adapter.
//!
//! Drives a native engine exposed as a table of `extern "C"` functions.
//! The completion sink crosses the boundary as an opaque context pointer
//! (a leaked `Box<Arc<dyn CompletionSink>>`) together with three
//! trampolines. The context is reclaimed only after the engine's `close`
//! has returned, or immediately if `create` returned null.
//!
//! Native side contract:
//! - `create` receives the connection config as UTF-8 JSON.
//! - `submit` receives `arg_count` descriptors; the bytes they point to are
//!   valid until `submit` returns, or until completion when
//!   `retains_arguments` is set.
//! - `success` with a null `data` pointer means "no payload". Non-null data
//!   only needs to stay valid for the duration of the call.
//! - No callback may run after `close` returns.

#![allow(unsafe_code)]

use crate::domain::{
    ArgumentBuffer, ArgumentRetention, ConnectionConfig, CorrelationId, FfiArg, NativeErrorKind,
    RequestType,
};
use crate::ports::{CompletionSink, NativeEngine, NativeHandle};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::ffi::{c_char, c_void, CStr};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, error, warn};

pub type SuccessCallback =
    unsafe extern "C" fn(context: *const c_void, id: u64, data: *const u8, len: usize);
pub type FailureCallback = unsafe extern "C" fn(context: *const c_void, id: u64);
pub type ErrorCallback =
    unsafe extern "C" fn(context: *const c_void, id: u64, kind: u32, message: *const c_char);

/// Callbacks handed to the native `create` function.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CallbackTable {
    pub context: *const c_void,
    pub success: SuccessCallback,
    pub failure: FailureCallback,
    pub error: ErrorCallback,
}

/// Native entry points.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CEngineVTable {
    /// Returns null on failure.
    pub create: unsafe extern "C" fn(
        config: *const u8,
        config_len: usize,
        callbacks: CallbackTable,
    ) -> *const c_void,
    pub submit: unsafe extern "C" fn(
        handle: *const c_void,
        id: u64,
        request_type: u32,
        args: *const FfiArg,
        arg_count: usize,
    ),
    pub close: unsafe extern "C" fn(handle: *const c_void),
    /// Engine reads argument memory after `submit` returns.
    pub retains_arguments: bool,
}

type SinkContext = Arc<dyn CompletionSink>;

/// [`NativeEngine`] backed by a [`CEngineVTable`].
pub struct CEngine {
    vtable: CEngineVTable,
    /// handle -> leaked context pointer
    contexts: Mutex<HashMap<usize, usize>>,
}

impl CEngine {
    /// # Safety
    ///
    /// The function pointers must be valid for the lifetime of the engine and
    /// honor the contract in the module documentation.
    pub unsafe fn new(vtable: CEngineVTable) -> Self {
        Self {
            vtable,
            contexts: Mutex::new(HashMap::new()),
        }
    }

    /// Number of handles whose context is still leaked to the native side.
    pub fn open_handles(&self) -> usize {
        self.contexts.lock().len()
    }
}

impl NativeEngine for CEngine {
    fn create_handle(
        &self,
        config: &ConnectionConfig,
        callbacks: Arc<dyn CompletionSink>,
    ) -> Option<NativeHandle> {
        let config = match config.to_json_bytes() {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(error = %e, "Cannot encode connection config");
                return None;
            }
        };

        let context = Box::into_raw(Box::new(callbacks)) as *const c_void;
        let table = CallbackTable {
            context,
            success: success_trampoline,
            failure: failure_trampoline,
            error: error_trampoline,
        };

        // SAFETY: config outlives the call; the vtable contract is the caller's
        // obligation from `CEngine::new`.
        let raw = unsafe { (self.vtable.create)(config.as_ptr(), config.len(), table) };

        match NativeHandle::from_ptr(raw) {
            Some(handle) => {
                self.contexts.lock().insert(handle.as_raw(), context as usize);
                Some(handle)
            }
            None => {
                // SAFETY: `context` came from Box::into_raw above and the engine
                // holds no reference to it after a failed create.
                drop(unsafe { Box::from_raw(context as *mut SinkContext) });
                None
            }
        }
    }

    fn submit(
        &self,
        handle: &NativeHandle,
        id: CorrelationId,
        request_type: RequestType,
        args: &Arc<ArgumentBuffer>,
    ) {
        let descriptors = args.as_ffi();
        // SAFETY: descriptors point into `args`, which the dispatcher keeps
        // alive for as long as the declared retention requires.
        unsafe {
            (self.vtable.submit)(
                handle.as_ptr(),
                id.raw(),
                request_type.as_raw(),
                descriptors.as_ptr(),
                descriptors.len(),
            )
        }
    }

    fn close_handle(&self, handle: NativeHandle) {
        let raw = handle.as_raw();
        // SAFETY: the handle came from `create` and is consumed here.
        unsafe { (self.vtable.close)(handle.as_ptr()) };

        match self.contexts.lock().remove(&raw) {
            // SAFETY: no callback can run after close returned, so this is
            // the last reference to the leaked box.
            Some(context) => drop(unsafe { Box::from_raw(context as *mut SinkContext) }),
            None => warn!(handle = raw, "Closed a handle with no registered context"),
        }
        debug!(handle = raw, "Native handle closed");
    }

    fn argument_retention(&self) -> ArgumentRetention {
        if self.vtable.retains_arguments {
            ArgumentRetention::UntilCompletion
        } else {
            ArgumentRetention::CopiedOnSubmit
        }
    }
}

impl std::fmt::Debug for CEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CEngine")
            .field("open_handles", &self.open_handles())
            .field("retains_arguments", &self.vtable.retains_arguments)
            .finish()
    }
}

fn with_sink(context: *const c_void, callback: &'static str, f: impl FnOnce(&dyn CompletionSink)) {
    if context.is_null() {
        warn!(callback, "Native callback with null context");
        return;
    }
    // SAFETY: non-null contexts are only ever the pointer produced in
    // `create_handle`, alive until `close` returns.
    let sink: &SinkContext = unsafe { &*(context as *const SinkContext) };
    // Unwinding into C is undefined behavior.
    if catch_unwind(AssertUnwindSafe(|| f(sink.as_ref()))).is_err() {
        error!(callback, "Panic in completion callback");
    }
}

unsafe extern "C" fn success_trampoline(
    context: *const c_void,
    id: u64,
    data: *const u8,
    len: usize,
) {
    let result = if data.is_null() {
        None
    } else {
        // SAFETY: the engine guarantees `len` readable bytes for this call.
        Some(unsafe { std::slice::from_raw_parts(data, len) })
    };
    with_sink(context, "success", |sink| {
        sink.on_success(CorrelationId::new(id), result)
    });
}

unsafe extern "C" fn failure_trampoline(context: *const c_void, id: u64) {
    with_sink(context, "failure", |sink| sink.on_failure(CorrelationId::new(id)));
}

unsafe extern "C" fn error_trampoline(
    context: *const c_void,
    id: u64,
    kind: u32,
    message: *const c_char,
) {
    let message = if message.is_null() {
        String::new()
    } else {
        // SAFETY: the engine passes a NUL-terminated string valid for this call.
        unsafe { CStr::from_ptr(message) }
            .to_string_lossy()
            .into_owned()
    };
    let kind = NativeErrorKind::from_raw(kind);
    with_sink(context, "error", |sink| {
        sink.on_error(CorrelationId::new(id), kind, &message)
    });
}
