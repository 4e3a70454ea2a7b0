//! # Glide Bridge Benchmarks
//!
//! | Path | Target |
//! |------|--------|
//! | Argument marshal (64 KiB) | < 50µs |
//! | Dispatch + inline answer + await | < 20µs |
//! | 1000-deep ping burst, in-process engine | < 10ms |

use bridge_tests::benchmarks::dispatch::{bench_in_flight, bench_marshal, bench_round_trip};
use criterion::{criterion_group, criterion_main};

criterion_group!(benches, bench_marshal, bench_round_trip, bench_in_flight);
criterion_main!(benches);
