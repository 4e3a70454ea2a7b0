//! # Telemetry
//!
//! Bridge logging through the telemetry crate's subscriber.

#[cfg(test)]
mod tests {
    use bridge_telemetry::{init_telemetry, LogLevel, TelemetryConfig, TelemetryError};
    use glide_bridge::{Client, ClientConfig, InMemoryEngine};
    use std::sync::Arc;

    // Only test in this crate that installs the global subscriber.
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_client_logs_through_subscriber() {
        let dir = tempfile::tempdir().unwrap();
        let log_file = dir.path().join("bridge.log");
        let config = TelemetryConfig::default()
            .with_level(LogLevel::Trace)
            .with_log_file(&log_file);
        let guard = match init_telemetry(config) {
            Ok(guard) => Some(guard),
            Err(TelemetryError::AlreadyInitialized(_)) => None,
            Err(e) => panic!("telemetry init failed: {e}"),
        };

        let client =
            Client::connect(Arc::new(InMemoryEngine::new()), ClientConfig::default()).unwrap();
        client.set("logged", "yes").await.unwrap();
        bridge_telemetry::log(LogLevel::Info, "engine", "engine says hello");
        client.close();

        if let Some(guard) = guard {
            assert_eq!(guard.level(), Some(LogLevel::Trace));
            drop(guard);

            let contents = std::fs::read_to_string(&log_file).unwrap();
            assert!(contents.contains("Client connected"));
            assert!(contents.contains("engine says hello"));
            assert!(contents.contains("Client closed"));
        }
    }
}
