//! Domain types for the bridge.
//!
//! Correlation state, operation tags, replies, configuration and errors.
//! Nothing in here talks to the native engine.

pub mod allocator;
pub mod buffer;
pub mod config;
pub mod correlation;
pub mod error;
pub mod reply;
pub mod request_type;
pub mod table;

// Re-exports for convenience
pub use allocator::{IdReusePolicy, IndexAllocator};
pub use buffer::{ArgumentBuffer, ArgumentRetention, FfiArg};
pub use config::{
    AuthenticationInfo, ClientConfig, ConfigError, ConnectionConfig, ConnectionRetryStrategy,
    CorrelationConfig, NodeAddress, ProtocolVersion, ReadFrom, TlsMode,
};
pub use correlation::CorrelationId;
pub use error::{BridgeError, BridgeResult, NativeErrorKind};
pub use reply::Reply;
pub use request_type::RequestType;
pub use table::{CorrelationTable, PendingOperation, PendingStats, Settlement, StatsSnapshot};
