//! # Glide Bridge Benchmarks
//!
//! Criterion benchmarks for the dispatch → callback → resolve path.

pub mod dispatch;
