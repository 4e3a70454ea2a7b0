//! Ports (hexagonal architecture) between the bridge and the native engine.

pub mod inbound;
pub mod outbound;

pub use inbound::CompletionSink;
pub use outbound::{NativeEngine, NativeHandle};
