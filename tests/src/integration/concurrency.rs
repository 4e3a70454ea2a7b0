//! # Concurrent Dispatch and Completion
//!
//! Many callers dispatch at once while engine threads complete operations
//! in arbitrary order. Every caller must receive exactly its own reply.

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use futures::future::join_all;
    use glide_bridge::testing::RecordingEngine;
    use glide_bridge::{
        Client, ClientConfig, CorrelationId, IdReusePolicy, InMemoryConfig, InMemoryEngine,
        RequestType,
    };
    use rand::seq::SliceRandom;
    use std::collections::HashSet;
    use std::sync::Arc;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn in_memory_client(workers: usize) -> (Arc<InMemoryEngine>, Arc<Client>) {
        let engine = Arc::new(InMemoryEngine::with_config(InMemoryConfig {
            worker_threads: workers,
            ..InMemoryConfig::default()
        }));
        let client = Client::connect(engine.clone(), ClientConfig::default()).unwrap();
        (engine, Arc::new(client))
    }

    // =============================================================================
    // IN-PROCESS ENGINE
    // =============================================================================

    /// Each task writes and reads back its own key; no reply is cross-delivered.
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_parallel_callers_get_their_own_replies() {
        let (_engine, client) = in_memory_client(4);

        let tasks = (0..200).map(|i| {
            let client = Arc::clone(&client);
            tokio::spawn(async move {
                let key = format!("key-{i}");
                let value = format!("value-{i}");
                client.set(&key, &value).await.unwrap();
                let read = client.get(&key).await.unwrap();
                assert_eq!(read, Some(Bytes::from(value)));
            })
        });

        for result in join_all(tasks).await {
            result.unwrap();
        }
        assert_eq!(client.pending_count(), 0);

        let stats = client.stats();
        assert_eq!(stats.registered, 400);
        assert_eq!(stats.dropped_callbacks, 0);
    }

    /// Concurrent INCRs on one key all land, each caller seeing a distinct value.
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_increments_are_distinct() {
        let (_engine, client) = in_memory_client(3);

        let replies =
            join_all((0..50).map(|_| client.execute(RequestType::Incr, ["counter"]))).await;

        let seen: HashSet<i64> = replies
            .into_iter()
            .map(|r| r.unwrap().as_i64().unwrap())
            .collect();
        assert_eq!(seen, (1..=50).collect::<HashSet<i64>>());
    }

    // =============================================================================
    // OUT-OF-ORDER COMPLETION
    // =============================================================================

    /// Completions arrive shuffled, from several foreign threads.
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_shuffled_completion_from_foreign_threads() {
        let engine = Arc::new(RecordingEngine::new());
        let client = Client::connect(engine.clone(), ClientConfig::default()).unwrap();

        let replies: Vec<_> = (0..300)
            .map(|i| client.dispatch(RequestType::GetString, [format!("k{i}")]).unwrap())
            .collect();

        let mut ids: Vec<CorrelationId> = replies.iter().map(|r| r.id()).collect();
        ids.shuffle(&mut rand::thread_rng());

        let threads: Vec<_> = ids
            .chunks(75)
            .map(|chunk| {
                let engine = Arc::clone(&engine);
                let chunk = chunk.to_vec();
                std::thread::spawn(move || {
                    for id in chunk {
                        let payload = format!("reply-{}", id.raw());
                        engine.complete(id, Some(payload.as_bytes()));
                    }
                })
            })
            .collect();
        for thread in threads {
            thread.join().unwrap();
        }

        for reply in replies {
            let id = reply.id();
            let value = reply.await.unwrap();
            assert_eq!(value.as_str(), Some(format!("reply-{}", id.raw()).as_str()));
        }
        assert_eq!(client.pending_count(), 0);
    }

    /// Ids of concurrently pending operations are unique, under both policies.
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_pending_ids_unique_across_threads() {
        for policy in [IdReusePolicy::Monotonic, IdReusePolicy::Recycle] {
            let engine = Arc::new(RecordingEngine::new());
            let mut config = ClientConfig::default();
            config.correlation.id_reuse = policy;
            let client = Arc::new(Client::connect(engine.clone(), config).unwrap());

            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let client = Arc::clone(&client);
                    std::thread::spawn(move || {
                        (0..250)
                            .map(|_| client.dispatch(RequestType::Ping, Vec::<&str>::new()).unwrap())
                            .collect::<Vec<_>>()
                    })
                })
                .collect();

            let replies: Vec<_> = handles
                .into_iter()
                .flat_map(|h| h.join().unwrap())
                .collect();
            let ids: HashSet<CorrelationId> = replies.iter().map(|r| r.id()).collect();

            assert_eq!(ids.len(), 2000, "{policy:?}");
            assert_eq!(client.pending_count(), 2000);
            client.close();
        }
    }
}
