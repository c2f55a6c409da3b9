//! Benchmarks for the radix-2 FFT.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use patchsynth::dsp::complex::Complex64;
use patchsynth::dsp::fft::{fft_in_place, rfft};

use crate::BLOCK_SIZES;

pub fn bench_fft(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/fft");

    for &size in BLOCK_SIZES {
        let signal: Vec<f64> = (0..size).map(|i| (i as f64 * 0.1).sin()).collect();
        let complex: Vec<Complex64> = signal.iter().map(|&s| Complex64::new(s, 0.0)).collect();

        let mut buffer = complex.clone();
        group.bench_with_input(BenchmarkId::new("complex", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&complex);
                fft_in_place(black_box(&mut buffer)).unwrap();
            })
        });

        group.bench_with_input(BenchmarkId::new("real", size), &size, |b, _| {
            b.iter(|| rfft(black_box(&signal)))
        });
    }

    group.finish();
}
