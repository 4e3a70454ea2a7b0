//! # Shutdown
//!
//! Close fails everything still pending, releases the native handle once,
//! and races safely with completions arriving on engine threads.

#[cfg(test)]
mod tests {
    use glide_bridge::testing::RecordingEngine;
    use glide_bridge::{
        BridgeError, Client, ClientConfig, InMemoryEngine, RequestType,
    };
    use std::sync::Arc;

    /// Close runs while an engine thread is still completing operations.
    /// Every reply settles exactly once, as either its value or ClientClosed.
    #[tokio::test]
    async fn test_close_races_with_completions() {
        let engine = Arc::new(RecordingEngine::new());
        let client = Client::connect(engine.clone(), ClientConfig::default()).unwrap();
        let sink = engine.sink().unwrap();

        let replies: Vec<_> = (0..200)
            .map(|i| client.dispatch(RequestType::GetString, [format!("k{i}")]).unwrap())
            .collect();
        let ids: Vec<_> = replies.iter().map(|r| r.id()).collect();

        let completer = std::thread::spawn(move || {
            for id in ids {
                sink.on_success(id, Some(b"v"));
            }
        });
        client.close();
        completer.join().unwrap();

        let mut values = 0u64;
        let mut closed = 0u64;
        for reply in replies {
            match reply.await {
                Ok(reply) => {
                    assert_eq!(reply.as_str(), Some("v"));
                    values += 1;
                }
                Err(BridgeError::ClientClosed) => closed += 1,
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }

        let stats = client.stats();
        assert_eq!(values + closed, 200);
        assert_eq!(stats.completed, values);
        assert_eq!(stats.force_closed, closed);
        assert_eq!(stats.dropped_callbacks, closed);
        assert_eq!(engine.close_count(), 1);
    }

    /// Many tasks racing to close still release the handle exactly once.
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_close_releases_once() {
        let engine = Arc::new(RecordingEngine::new());
        let client = Arc::new(Client::connect(engine.clone(), ClientConfig::default()).unwrap());
        let pending = client.dispatch(RequestType::GetString, ["k"]).unwrap();

        let closers: Vec<_> = (0..16)
            .map(|_| {
                let client = Arc::clone(&client);
                tokio::spawn(async move { client.close() })
            })
            .collect();
        for closer in closers {
            closer.await.unwrap();
        }

        assert_eq!(pending.await, Err(BridgeError::ClientClosed));
        assert_eq!(engine.close_count(), 1);
        assert_eq!(client.stats().force_closed, 1);
    }

    /// Every entry point fails fast after close.
    #[tokio::test]
    async fn test_calls_after_close_fail_fast() {
        let engine = Arc::new(RecordingEngine::new());
        let client = Client::connect(engine.clone(), ClientConfig::default()).unwrap();
        client.close();

        assert_eq!(client.get("k").await, Err(BridgeError::ClientClosed));
        assert_eq!(client.set("k", "v").await, Err(BridgeError::ClientClosed));
        assert_eq!(client.ping().await, Err(BridgeError::ClientClosed));
        assert_eq!(
            client.custom_command(["PING"]).await,
            Err(BridgeError::ClientClosed)
        );
        assert!(engine.submissions().is_empty());
    }

    /// Closing with work queued on real engine threads: workers finish and
    /// exit, queued completions are dropped, callers see ClientClosed.
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_close_with_in_memory_work_in_flight() {
        let engine = Arc::new(InMemoryEngine::new());
        let client = Client::connect(engine.clone(), ClientConfig::default()).unwrap();

        let replies: Vec<_> = (0..500)
            .map(|i| {
                client
                    .dispatch(RequestType::SetString, [format!("k{i}"), "v".to_string()])
                    .unwrap()
            })
            .collect();
        client.close();

        assert_eq!(engine.open_handles(), 0);
        assert_eq!(client.pending_count(), 0);
        for reply in replies {
            match reply.await {
                Ok(_) | Err(BridgeError::ClientClosed) => {}
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }
    }

    /// Dropping the last reference to an open client closes it.
    #[tokio::test]
    async fn test_drop_closes() {
        let engine = Arc::new(InMemoryEngine::new());
        {
            let client = Client::connect(engine.clone(), ClientConfig::default()).unwrap();
            client.set("k", "v").await.unwrap();
            assert_eq!(engine.open_handles(), 1);
        }
        assert_eq!(engine.open_handles(), 0);
        assert_eq!(engine.key_count(), 1);
    }
}
