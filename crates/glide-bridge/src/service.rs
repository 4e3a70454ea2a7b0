//! Client service - the caller-facing entry point and lifecycle manager.
//!
//! A client is Open from the moment `connect` returns until the first
//! `close` (or drop). Close is idempotent: remaining operations are failed
//! with `ClientClosed` and the native handle is released exactly once.

use crate::dispatcher::{PendingReply, RequestDispatcher};
use crate::domain::{
    BridgeError, BridgeResult, ClientConfig, CorrelationTable, Reply, RequestType, Settlement,
    StatsSnapshot,
};
use crate::ports::{NativeEngine, NativeHandle};
use crate::router::CallbackRouter;
use bytes::Bytes;
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{debug, info};

enum Lifecycle {
    Open {
        handle: NativeHandle,
        router: Arc<CallbackRouter>,
    },
    Closed,
}

/// Async client bound to one native engine handle.
pub struct Client {
    engine: Arc<dyn NativeEngine>,
    table: Arc<CorrelationTable>,
    dispatcher: RequestDispatcher,
    /// Read-locked across insert+submit, write-locked by close.
    state: RwLock<Lifecycle>,
}

impl Client {
    /// Connect using the ambient tokio runtime for completion delivery.
    pub fn connect(engine: Arc<dyn NativeEngine>, config: ClientConfig) -> BridgeResult<Self> {
        let runtime = Handle::try_current().map_err(|e| {
            BridgeError::ConstructionFailure(format!("no tokio runtime available: {e}"))
        })?;
        Self::connect_with_runtime(engine, config, &runtime)
    }

    /// Connect, delivering completions on `runtime`.
    pub fn connect_with_runtime(
        engine: Arc<dyn NativeEngine>,
        config: ClientConfig,
        runtime: &Handle,
    ) -> BridgeResult<Self> {
        config
            .validate()
            .map_err(|e| BridgeError::ConstructionFailure(e.to_string()))?;

        let table = Arc::new(CorrelationTable::new(config.correlation.id_reuse));
        let router = CallbackRouter::start(Arc::clone(&table), runtime);

        let handle = engine
            .create_handle(&config.connection, router.clone())
            .ok_or_else(|| {
                BridgeError::ConstructionFailure("native engine returned a null handle".into())
            })?;

        let dispatcher = RequestDispatcher::new(Arc::clone(&engine), Arc::clone(&table));
        info!(
            addresses = config.connection.addresses.len(),
            cluster_mode = config.connection.cluster_mode,
            id_reuse = ?config.correlation.id_reuse,
            retention = ?dispatcher.retention(),
            "Client connected"
        );

        Ok(Self {
            engine,
            table,
            dispatcher,
            state: RwLock::new(Lifecycle::Open { handle, router }),
        })
    }

    /// Submit one operation and return its awaitable reply.
    ///
    /// Fails immediately with `ClientClosed` after close, without touching
    /// the engine.
    pub fn dispatch<I, A>(&self, request_type: RequestType, args: I) -> BridgeResult<PendingReply>
    where
        I: IntoIterator<Item = A>,
        A: AsRef<[u8]>,
    {
        let state = self.state.read();
        match &*state {
            Lifecycle::Open { handle, .. } => self.dispatcher.dispatch(handle, request_type, args),
            Lifecycle::Closed => Err(BridgeError::ClientClosed),
        }
    }

    /// Submit and await one operation.
    pub async fn execute<I, A>(&self, request_type: RequestType, args: I) -> BridgeResult<Reply>
    where
        I: IntoIterator<Item = A>,
        A: AsRef<[u8]>,
    {
        self.dispatch(request_type, args)?.await
    }

    /// GET. `None` when the key holds no value.
    pub async fn get(&self, key: impl AsRef<[u8]>) -> BridgeResult<Option<Bytes>> {
        let reply = self.execute(RequestType::GetString, [key.as_ref()]).await?;
        Ok(match reply {
            Reply::Data(data) => Some(data),
            Reply::Ok | Reply::Nil => None,
        })
    }

    /// SET.
    pub async fn set(&self, key: impl AsRef<[u8]>, value: impl AsRef<[u8]>) -> BridgeResult<()> {
        self.execute(RequestType::SetString, [key.as_ref(), value.as_ref()])
            .await
            .map(|_| ())
    }

    pub async fn ping(&self) -> BridgeResult<Reply> {
        self.execute(RequestType::Ping, std::iter::empty::<&[u8]>())
            .await
    }

    /// Arbitrary command; the first argument is the command name.
    pub async fn custom_command<I, A>(&self, args: I) -> BridgeResult<Reply>
    where
        I: IntoIterator<Item = A>,
        A: AsRef<[u8]>,
    {
        self.execute(RequestType::CustomCommand, args).await
    }

    /// Close the client.
    ///
    /// Every pending operation fails with `ClientClosed`, then the native
    /// handle is released. Later calls are no-ops.
    ///
    /// Blocking: this runs the engine's `close_handle` on the calling thread,
    /// and engines may join their worker threads there (`InMemoryEngine`
    /// does). From async code with such an engine, close or drop the client
    /// inside `tokio::task::spawn_blocking`.
    pub fn close(&self) {
        let previous = {
            let mut state = self.state.write();
            std::mem::replace(&mut *state, Lifecycle::Closed)
        };
        let Lifecycle::Open { handle, router } = previous else {
            return;
        };

        let drained = self.table.drain_all();
        let failed = drained.len();
        // In-flight arguments stay pinned until the engine has closed the handle.
        let mut pinned = Vec::new();
        for mut op in drained {
            let id = op.id();
            pinned.extend(op.take_retained());
            let delivered = op.reject(BridgeError::ClientClosed);
            self.table.record_settled(id, Settlement::ForceClosed, delivered);
        }

        debug!(
            handle = handle.as_raw(),
            pinned_buffers = pinned.len(),
            "Releasing native handle"
        );
        self.engine.close_handle(handle);
        drop(pinned);
        // The engine has let go of its reference; this ends the resolver.
        drop(router);

        info!(failed_pending = failed, "Client closed");
    }

    pub fn is_closed(&self) -> bool {
        matches!(*self.state.read(), Lifecycle::Closed)
    }

    /// Get number of operations awaiting a native completion
    pub fn pending_count(&self) -> usize {
        self.table.pending_count()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.table.stats().snapshot()
    }
}

/// Dropping an open client closes it, with the same blocking behavior as
/// [`Client::close`].
impl Drop for Client {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("closed", &self.is_closed())
            .field("table", &self.table)
            .finish()
    }
}
