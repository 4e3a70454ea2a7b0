// Allow missing docs for internal items in development
#![allow(missing_docs)]

//! Glide Bridge - async callback correlation between callers and a native engine.
//!
//! Callers dispatch tagged operations and await a [`PendingReply`]. The
//! native engine answers on its own threads through id-keyed callbacks;
//! the bridge matches each callback to its operation and settles it on the
//! caller's tokio runtime.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                              Client                                  │
//! │                  (lifecycle: Open ──close──▶ Closed)                 │
//! ├──────────────────────────────────────────────────────────────────────┤
//! │  ┌──────────────────┐        ┌────────────────────────────────────┐  │
//! │  │ RequestDispatcher│─insert▶│        CorrelationTable            │  │
//! │  │ marshal + submit │        │  DashMap<CorrelationId, Pending>   │  │
//! │  └────────┬─────────┘        │  IndexAllocator (monotonic/recycle)│  │
//! │           │                  └──────────────▲─────────────────────┘  │
//! │           │                                 │ lookup_and_remove      │
//! │           │                  ┌──────────────┴─────────────────────┐  │
//! │           │                  │         CallbackRouter             │  │
//! │           │                  │  engine thread ──queue──▶ resolver │  │
//! │           │                  └──────────────▲─────────────────────┘  │
//! └───────────┼─────────────────────────────────┼────────────────────────┘
//!             │ submit(handle, id, tag, args)   │ success / failure / error
//!             ▼                                 │
//!     ┌───────────────────────────────────────────────┐
//!     │     NativeEngine (C ABI or in-process)        │
//!     └───────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use glide_bridge::{Client, ClientConfig, InMemoryEngine};
//! use std::sync::Arc;
//!
//! let client = Client::connect(Arc::new(InMemoryEngine::new()), ClientConfig::default())?;
//! client.set("key", "value").await?;
//! let value = client.get("key").await?;
//! client.close();
//! ```

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod adapters;
pub mod dispatcher;
pub mod domain;
pub mod ports;
pub mod router;
pub mod service;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

// Re-exports
pub use adapters::{CEngine, CEngineVTable, CallbackTable, InMemoryConfig, InMemoryEngine};
pub use dispatcher::{PendingReply, RequestDispatcher};
pub use domain::{
    ArgumentBuffer, ArgumentRetention, BridgeError, BridgeResult, ClientConfig, ConfigError,
    ConnectionConfig, CorrelationId, CorrelationTable, IdReusePolicy, NativeErrorKind, NodeAddress,
    Reply, RequestType, StatsSnapshot,
};
pub use ports::{CompletionSink, NativeEngine, NativeHandle};
pub use router::CallbackRouter;
pub use service::Client;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
