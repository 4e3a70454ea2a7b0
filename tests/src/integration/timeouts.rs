//! # Caller-Side Timeouts
//!
//! The bridge never cancels native work. A caller racing its reply against
//! a timer only stops waiting; the operation stays registered until the
//! engine answers or the client closes.

#[cfg(test)]
mod tests {
    use glide_bridge::testing::RecordingEngine;
    use glide_bridge::{BridgeError, Client, ClientConfig, InMemoryEngine, RequestType};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_timed_out_operation_stays_pending() {
        let engine = Arc::new(RecordingEngine::new());
        let client = Client::connect(engine.clone(), ClientConfig::default()).unwrap();

        let reply = client.dispatch(RequestType::GetString, ["slow"]).unwrap();
        let id = reply.id();
        assert!(timeout(Duration::from_millis(20), reply).await.is_err());
        assert_eq!(client.pending_count(), 1);

        // Late answer settles into the void.
        engine.complete(id, Some(b"finally"));
        tokio::task::yield_now().await;
        assert_eq!(client.pending_count(), 0);
        assert_eq!(client.stats().dropped_callbacks, 0);
    }

    #[tokio::test]
    async fn test_timed_out_operation_failed_at_close() {
        let engine = Arc::new(RecordingEngine::new());
        let client = Client::connect(engine.clone(), ClientConfig::default()).unwrap();

        let reply = client.dispatch(RequestType::GetString, ["slow"]).unwrap();
        assert!(timeout(Duration::from_millis(10), reply).await.is_err());

        client.close();
        let stats = client.stats();
        assert_eq!(stats.force_closed, 1);
        assert_eq!(stats.abandoned, 1);
    }

    #[tokio::test]
    async fn test_answer_within_deadline() {
        let engine = Arc::new(RecordingEngine::new());
        let client = Client::connect(engine.clone(), ClientConfig::default()).unwrap();

        let reply = client.dispatch(RequestType::GetString, ["fast"]).unwrap();
        let id = reply.id();
        let completer = {
            let engine = Arc::clone(&engine);
            std::thread::spawn(move || {
                std::thread::sleep(Duration::from_millis(5));
                engine.complete(id, Some(b"in time"));
            })
        };

        let value = timeout(Duration::from_secs(5), reply).await.unwrap().unwrap();
        assert_eq!(value.as_str(), Some("in time"));
        completer.join().unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_in_memory_round_trip_within_deadline() {
        let engine = Arc::new(InMemoryEngine::new());
        let client = Client::connect(engine, ClientConfig::default()).unwrap();

        let result = timeout(Duration::from_secs(5), client.set("k", "v")).await;
        assert_eq!(result.unwrap(), Ok(()));

        let missing = timeout(Duration::from_secs(5), client.execute(RequestType::HashGet, ["h"]))
            .await
            .unwrap();
        assert!(matches!(missing, Err(BridgeError::OperationFailure { .. })));
    }
}
