//! Benchmarks for DSP primitives and real-world scenarios.
//!
//! Run with: cargo bench
//!
//! Rendering is offline, but blocks should still finish well inside their
//! real-time duration so long pieces render quickly.
//!
//! Reference durations at 44.1kHz sample rate:
//!   - 64 samples  = 1.45ms
//!   - 256 samples = 5.80ms
//!   - 1024 samples = 23.2ms
//!   - 4096 samples = 92.9ms
//!
//! Benchmark groups:
//!   - dsp/*        Low-level primitives (oscillator, filter, fft, envelope)
//!   - scenarios/*  Patches built from JSON and whole voice measures

use criterion::{criterion_group, criterion_main};

mod dsp;
mod scenarios;

/// Common buffer sizes used when rendering.
pub const BLOCK_SIZES: &[usize] = &[64, 256, 1024, 4096];

pub const SAMPLE_RATE: f64 = 44_100.0;

criterion_group!(
    benches,
    // Low-level DSP primitives
    dsp::bench_oscillator,
    dsp::bench_filter,
    dsp::bench_fft,
    dsp::bench_envelope,
    // Real-world scenarios
    scenarios::bench_voices,
);
criterion_main!(benches);
