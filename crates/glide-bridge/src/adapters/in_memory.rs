//! In-process engine.
//!
//! A small key/value store served by its own worker threads, standing in for
//! the native engine in demos and tests. Callbacks arrive on the worker
//! threads, exactly as they would from a real engine.

use crate::domain::{
    ArgumentBuffer, ArgumentRetention, ConnectionConfig, CorrelationId, NativeErrorKind,
    RequestType,
};
use crate::ports::{CompletionSink, NativeEngine, NativeHandle};
use bytes::Bytes;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{debug, warn};

/// In-memory engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InMemoryConfig {
    /// Worker threads per handle
    pub worker_threads: usize,
    /// Make every `create_handle` fail
    pub refuse_connections: bool,
}

impl Default for InMemoryConfig {
    fn default() -> Self {
        Self {
            worker_threads: 2,
            refuse_connections: false,
        }
    }
}

type Store = RwLock<HashMap<Bytes, Bytes>>;

struct Job {
    id: CorrelationId,
    request_type: RequestType,
    args: Arc<ArgumentBuffer>,
}

struct Workers {
    queue: flume::Sender<Job>,
    threads: Vec<JoinHandle<()>>,
}

/// What a command evaluates to.
#[derive(Debug, PartialEq)]
enum Outcome {
    Value(Option<Bytes>),
    Error(String),
    Unsupported,
}

/// Key/value engine with GET/SET/DEL/EXISTS/PING/ECHO/INCR.
///
/// All handles share one keyspace.
pub struct InMemoryEngine {
    config: InMemoryConfig,
    store: Arc<Store>,
    next_handle: AtomicUsize,
    handles: Mutex<HashMap<usize, Workers>>,
}

impl InMemoryEngine {
    pub fn new() -> Self {
        Self::with_config(InMemoryConfig::default())
    }

    pub fn with_config(config: InMemoryConfig) -> Self {
        Self {
            config,
            store: Arc::new(RwLock::new(HashMap::new())),
            next_handle: AtomicUsize::new(1),
            handles: Mutex::new(HashMap::new()),
        }
    }

    /// Number of keys currently stored.
    pub fn key_count(&self) -> usize {
        self.store.read().len()
    }

    pub fn open_handles(&self) -> usize {
        self.handles.lock().len()
    }

    fn spawn_workers(
        &self,
        handle: usize,
        sink: Arc<dyn CompletionSink>,
    ) -> std::io::Result<Workers> {
        let (queue, jobs) = flume::unbounded::<Job>();
        let mut threads = Vec::with_capacity(self.config.worker_threads);
        for n in 0..self.config.worker_threads.max(1) {
            let jobs = jobs.clone();
            let sink = Arc::clone(&sink);
            let store = Arc::clone(&self.store);
            let thread = std::thread::Builder::new()
                .name(format!("in-memory-engine-{handle}-{n}"))
                .spawn(move || {
                    while let Ok(job) = jobs.recv() {
                        deliver(sink.as_ref(), job.id, execute(&store, job.request_type, &job.args));
                    }
                })?;
            threads.push(thread);
        }
        Ok(Workers { queue, threads })
    }
}

impl Default for InMemoryEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl NativeEngine for InMemoryEngine {
    fn create_handle(
        &self,
        config: &ConnectionConfig,
        callbacks: Arc<dyn CompletionSink>,
    ) -> Option<NativeHandle> {
        if self.config.refuse_connections {
            warn!(addresses = config.addresses.len(), "Refusing connection");
            return None;
        }

        let raw = self.next_handle.fetch_add(1, Ordering::Relaxed);
        let handle = NativeHandle::from_raw(raw)?;
        match self.spawn_workers(raw, callbacks) {
            Ok(workers) => {
                self.handles.lock().insert(raw, workers);
                debug!(handle = raw, workers = self.config.worker_threads, "Opened in-memory handle");
                Some(handle)
            }
            Err(e) => {
                warn!(error = %e, "Failed to spawn engine workers");
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
        let handles = self.handles.lock();
        let Some(workers) = handles.get(&handle.as_raw()) else {
            warn!(handle = handle.as_raw(), correlation_id = %id, "Submit on unknown handle");
            return;
        };
        let job = Job {
            id,
            request_type,
            args: Arc::clone(args),
        };
        if workers.queue.send(job).is_err() {
            warn!(correlation_id = %id, "Engine workers stopped");
        }
    }

    fn close_handle(&self, handle: NativeHandle) {
        let Some(Workers { queue, threads }) = self.handles.lock().remove(&handle.as_raw()) else {
            return;
        };
        // Workers drain what is queued, then exit once the sender is gone.
        drop(queue);
        for thread in threads {
            if thread.join().is_err() {
                warn!(handle = handle.as_raw(), "Engine worker panicked");
            }
        }
        debug!(handle = handle.as_raw(), "Closed in-memory handle");
    }

    fn argument_retention(&self) -> ArgumentRetention {
        // Workers read arguments after `submit` returns.
        ArgumentRetention::UntilCompletion
    }
}

impl std::fmt::Debug for InMemoryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryEngine")
            .field("config", &self.config)
            .field("open_handles", &self.open_handles())
            .finish()
    }
}

fn deliver(sink: &dyn CompletionSink, id: CorrelationId, outcome: Outcome) {
    match outcome {
        Outcome::Value(value) => sink.on_success(id, value.as_deref()),
        Outcome::Error(message) => sink.on_error(id, Some(NativeErrorKind::Request), &message),
        Outcome::Unsupported => sink.on_failure(id),
    }
}

fn execute(store: &Store, request_type: RequestType, args: &ArgumentBuffer) -> Outcome {
    let args: Vec<&[u8]> = args.iter().collect();
    match request_type {
        RequestType::CustomCommand => {
            let Some((name, rest)) = args.split_first() else {
                return Outcome::Error("empty command".into());
            };
            let name = String::from_utf8_lossy(name);
            match RequestType::from_command_name(&name) {
                Some(tag) => run(store, tag, rest),
                None => Outcome::Error(format!("unknown command '{name}'")),
            }
        }
        tag => run(store, tag, &args),
    }
}

fn run(store: &Store, request_type: RequestType, args: &[&[u8]]) -> Outcome {
    let name = request_type.command_name().unwrap_or("?");
    let arity_error = || Outcome::Error(format!("wrong number of arguments for '{name}' command"));

    match (request_type, args) {
        (RequestType::GetString, [key]) => {
            Outcome::Value(store.read().get(*key).cloned())
        }
        (RequestType::SetString, [key, value]) => {
            store
                .write()
                .insert(Bytes::copy_from_slice(key), Bytes::copy_from_slice(value));
            Outcome::Value(None)
        }
        (RequestType::Del, keys) if !keys.is_empty() => {
            let mut map = store.write();
            let removed = keys.iter().filter(|k| map.remove(**k).is_some()).count();
            integer(removed as i64)
        }
        (RequestType::Exists, keys) if !keys.is_empty() => {
            let map = store.read();
            integer(keys.iter().filter(|k| map.contains_key(**k)).count() as i64)
        }
        (RequestType::Ping, []) => Outcome::Value(Some(Bytes::from_static(b"PONG"))),
        (RequestType::Ping, [message]) | (RequestType::Echo, [message]) => {
            Outcome::Value(Some(Bytes::copy_from_slice(message)))
        }
        (RequestType::Incr, [key]) => {
            let mut map = store.write();
            let current = match map.get(*key) {
                None => 0,
                Some(value) => match std::str::from_utf8(value).ok().and_then(|s| s.parse::<i64>().ok()) {
                    Some(n) => n,
                    None => return Outcome::Error("value is not an integer or out of range".into()),
                },
            };
            let Some(next) = current.checked_add(1) else {
                return Outcome::Error("increment or decrement would overflow".into());
            };
            let encoded = Bytes::from(next.to_string());
            map.insert(Bytes::copy_from_slice(key), encoded.clone());
            Outcome::Value(Some(encoded))
        }
        (
            RequestType::GetString
            | RequestType::SetString
            | RequestType::Del
            | RequestType::Exists
            | RequestType::Ping
            | RequestType::Echo
            | RequestType::Incr,
            _,
        ) => arity_error(),
        _ => Outcome::Unsupported,
    }
}

fn integer(n: i64) -> Outcome {
    Outcome::Value(Some(Bytes::from(n.to_string())))
}
