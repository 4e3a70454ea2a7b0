//! Inbound (driving) ports: calls the native engine makes into the bridge.

use crate::domain::{CorrelationId, NativeErrorKind};

/// Completion callbacks registered with the engine at handle creation.
///
/// Invoked on engine-owned threads. Implementations must return quickly,
/// must not block, and must never call back into the engine.
pub trait CompletionSink: Send + Sync {
    /// Operation `id` succeeded. `result` is only valid for the duration of
    /// the call; `None` means the engine produced no payload.
    fn on_success(&self, id: CorrelationId, result: Option<&[u8]>);

    /// Operation `id` failed without further detail.
    fn on_failure(&self, id: CorrelationId);

    /// Operation `id` failed with an engine error category and message.
    ///
    /// Engines that only report bare failures never call this.
    fn on_error(&self, id: CorrelationId, kind: Option<NativeErrorKind>, message: &str) {
        let _ = (kind, message);
        self.on_failure(id);
    }
}
