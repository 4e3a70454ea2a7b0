//! # Dispatch Path Benchmarks
//!
//! Claims to validate:
//! - Argument marshaling is linear in payload size
//! - Table insert + lookup_and_remove stays flat as the table grows
//! - A full dispatch/complete/await round trip costs microseconds, not
//!   milliseconds, even with thousands of operations in flight

use criterion::{black_box, BenchmarkId, Criterion, Throughput};
use glide_bridge::testing::RecordingEngine;
use glide_bridge::{
    ArgumentBuffer, Client, ClientConfig, IdReusePolicy, InMemoryEngine, RequestType,
};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("benchmark runtime")
}

pub fn bench_marshal(c: &mut Criterion) {
    let mut group = c.benchmark_group("argument-marshal");

    for size in [16usize, 256, 4096, 65536] {
        let mut value = vec![0u8; size];
        rand::thread_rng().fill(value.as_mut_slice());

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("set", size), &value, |b, value| {
            b.iter(|| black_box(ArgumentBuffer::marshal([b"key".as_slice(), value.as_slice()])))
        });
    }
    group.finish();
}

pub fn bench_round_trip(c: &mut Criterion) {
    let runtime = runtime();
    let mut group = c.benchmark_group("round-trip");
    group.measurement_time(Duration::from_secs(5));

    for policy in [IdReusePolicy::Monotonic, IdReusePolicy::Recycle] {
        let engine = Arc::new(RecordingEngine::answering_inline(Some(b"value")));
        let mut config = ClientConfig::default();
        config.correlation.id_reuse = policy;
        let client =
            Client::connect_with_runtime(engine, config, runtime.handle()).expect("connect");

        group.bench_function(BenchmarkId::new("inline-answer", format!("{policy:?}")), |b| {
            b.iter(|| {
                let reply = client
                    .dispatch(RequestType::GetString, ["key"])
                    .expect("dispatch");
                black_box(runtime.block_on(reply).expect("reply"))
            })
        });
        client.close();
    }
    group.finish();
}

pub fn bench_in_flight(c: &mut Criterion) {
    let runtime = runtime();
    let mut group = c.benchmark_group("in-flight");
    group.measurement_time(Duration::from_secs(5));

    for depth in [10usize, 100, 1000] {
        let engine = Arc::new(InMemoryEngine::new());
        let client = Client::connect_with_runtime(engine, ClientConfig::default(), runtime.handle())
            .expect("connect");

        group.throughput(Throughput::Elements(depth as u64));
        group.bench_with_input(BenchmarkId::new("ping-burst", depth), &depth, |b, &depth| {
            b.iter(|| {
                let replies: Vec<_> = (0..depth)
                    .map(|_| {
                        client
                            .dispatch(RequestType::Ping, std::iter::empty::<&[u8]>())
                            .expect("dispatch")
                    })
                    .collect();
                runtime.block_on(async {
                    for reply in replies {
                        black_box(reply.await.expect("reply"));
                    }
                })
            })
        });
        client.close();
    }
    group.finish();
}
