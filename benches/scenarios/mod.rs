//! Real-world scenario benchmarks.
//!
//! These benchmarks model actual usage: patches built through the builder
//! and full voice measures.

mod voices;

pub use voices::bench_voices;
