//! Benchmarks for oscillator waveform generation.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use patchsynth::config::SynthRng;
use patchsynth::graph::node::{silent_buffers, AudioFormat, Generator, Note};
use patchsynth::graph::noise::WhiteNoise;
use patchsynth::graph::oscillator::{Linear, Oscillator};
use patchsynth::graph::supersaw::SuperSaw;
use rand::SeedableRng;

use crate::{BLOCK_SIZES, SAMPLE_RATE};

fn bench_generator<G: Generator>(
    group: &mut criterion::BenchmarkGroup<'_, criterion::measurement::WallTime>,
    name: &str,
    size: usize,
    mut generator: G,
) {
    let format = AudioFormat::new(SAMPLE_RATE, 1);
    let note = Note::new(69.0, 1.0, 0.0, f64::INFINITY);
    let mut buffers = silent_buffers(1, size);
    group.bench_with_input(BenchmarkId::new(name, size), &size, |b, &size| {
        b.iter(|| {
            generator
                .generate(black_box(&format), black_box(&note), size, &mut buffers, 0)
                .unwrap();
        })
    });
}

pub fn bench_oscillator(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/oscillator");

    for &size in BLOCK_SIZES {
        // Sine - uses sin() transcendental function
        bench_generator(&mut group, "sine", size, Oscillator::sine(Linear::new()));

        // Sawtooth - modulo per sample
        bench_generator(&mut group, "sawtooth", size, Oscillator::saw(Linear::new()));

        // Square - branch per sample
        bench_generator(&mut group, "square", size, Oscillator::square(Linear::new(), 0.5));

        // Seven detuned saws from one phase
        let detunes = vec![0.98, 0.99, 0.995, 1.0, 1.005, 1.01, 1.02];
        bench_generator(&mut group, "supersaw7", size, SuperSaw::new(Linear::new(), detunes, vec![]));

        // Noise - xoshiro PRNG
        bench_generator(&mut group, "noise", size, WhiteNoise::new(SynthRng::seed_from_u64(1)));
    }

    group.finish();
}
