//! # Stale and Duplicate Callbacks
//!
//! Callbacks for ids that are unknown, already settled or force-closed are
//! dropped and counted. They never disturb other pending operations.

#[cfg(test)]
mod tests {
    use glide_bridge::testing::RecordingEngine;
    use glide_bridge::{
        BridgeError, Client, ClientConfig, CorrelationId, IdReusePolicy, NativeErrorKind, Reply,
        RequestType,
    };
    use std::sync::Arc;

    fn connect(policy: IdReusePolicy) -> (Arc<RecordingEngine>, Client) {
        let engine = Arc::new(RecordingEngine::new());
        let mut config = ClientConfig::default();
        config.correlation.id_reuse = policy;
        let client = Client::connect(engine.clone(), config).unwrap();
        (engine, client)
    }

    #[tokio::test]
    async fn test_unknown_ids_leave_table_untouched() {
        let (engine, client) = connect(IdReusePolicy::Monotonic);
        let live = client.dispatch(RequestType::GetString, ["k"]).unwrap();

        for raw in [live.id().raw() + 1, live.id().raw() + 1000, u64::MAX] {
            let id = CorrelationId::new(raw);
            engine.complete(id, Some(b"stray"));
            engine.fail(id);
            engine.error(id, NativeErrorKind::Connection, "gone");
        }

        assert_eq!(client.pending_count(), 1);
        assert_eq!(client.stats().dropped_callbacks, 9);

        engine.complete(live.id(), Some(b"real"));
        assert_eq!(live.await.unwrap().as_str(), Some("real"));
    }

    #[tokio::test]
    async fn test_first_callback_wins() {
        let (engine, client) = connect(IdReusePolicy::Monotonic);
        let reply = client.dispatch(RequestType::SetString, ["k", "v"]).unwrap();
        let id = reply.id();

        engine.fail(id);
        engine.complete(id, None);
        engine.complete(id, Some(b"late"));

        assert_eq!(reply.await, Err(BridgeError::operation_failed(id)));
        assert_eq!(client.stats().dropped_callbacks, 2);
    }

    /// With recycling, a settled id may be reissued, but only after settlement.
    #[tokio::test]
    async fn test_recycled_id_never_shadows_live_operation() {
        let (engine, client) = connect(IdReusePolicy::Recycle);

        let first = client.dispatch(RequestType::Ping, Vec::<&str>::new()).unwrap();
        let second = client.dispatch(RequestType::Ping, Vec::<&str>::new()).unwrap();
        assert_ne!(first.id(), second.id());

        let first_id = first.id();
        engine.complete(first_id, None);
        assert_eq!(first.await.unwrap(), Reply::Ok);

        // first_id is free again; second is still live and must not be reused.
        let third = client.dispatch(RequestType::Ping, Vec::<&str>::new()).unwrap();
        let fourth = client.dispatch(RequestType::Ping, Vec::<&str>::new()).unwrap();
        assert_eq!(third.id(), first_id);
        assert_ne!(fourth.id(), second.id());
        assert_ne!(fourth.id(), third.id());
        assert_eq!(client.pending_count(), 3);
    }

    #[tokio::test]
    async fn test_monotonic_ids_never_repeat() {
        let (engine, client) = connect(IdReusePolicy::Monotonic);
        let mut last = None;

        for _ in 0..20 {
            let reply = client.dispatch(RequestType::Ping, Vec::<&str>::new()).unwrap();
            let id = reply.id();
            if let Some(previous) = last {
                assert!(id.raw() > previous);
            }
            last = Some(id.raw());
            engine.complete(id, None);
            reply.await.unwrap();
        }
    }
}
