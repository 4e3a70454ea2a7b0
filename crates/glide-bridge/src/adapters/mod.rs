//! Engine adapters.
//!
//! - [`ffi`]: an engine exposed through the C ABI
//! - [`in_memory`]: an in-process key/value engine on worker threads

pub mod ffi;
pub mod in_memory;

pub use ffi::{CEngine, CEngineVTable, CallbackTable};
pub use in_memory::{InMemoryConfig, InMemoryEngine};
