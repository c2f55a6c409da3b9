//! Benchmarks for IIR, biquad and FIR filters.

use std::f64::consts::PI;
use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use patchsynth::dsp::design::{digital_pzk, FilterKind, Prototype};
use patchsynth::dsp::fir::FirFilter;
use patchsynth::dsp::iir::{BiquadFilter, IirFilter};
use patchsynth::dsp::window::Window;
use patchsynth::graph::filter::Chain;
use patchsynth::graph::node::{AudioFormat, Filter};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

fn bench_filter_in_place<F: Filter>(
    group: &mut criterion::BenchmarkGroup<'_, criterion::measurement::WallTime>,
    name: &str,
    input: &[f64],
    mut filter: F,
) {
    let format = AudioFormat::new(SAMPLE_RATE, 1);
    let size = input.len();
    let mut buffers = vec![input.to_vec()];
    group.bench_with_input(BenchmarkId::new(name, size), &size, |b, &size| {
        b.iter(|| {
            buffers[0].copy_from_slice(input);
            filter
                .filter_in_place(black_box(&format), size, black_box(&mut buffers), 0)
                .unwrap();
        })
    });
}

pub fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/filter");
    let cutoff = 2.0 * PI * 1000.0 / SAMPLE_RATE;
    let lowpass = digital_pzk(Prototype::Butterworth, 4, FilterKind::Lowpass, cutoff, None).unwrap();

    for &size in BLOCK_SIZES {
        // Test signal (sawtooth-like ramp)
        let input: Vec<f64> = (0..size).map(|i| (i as f64 / size as f64) * 2.0 - 1.0).collect();

        // Degree-4 Butterworth, direct form
        let direct = IirFilter::from_pzk(&lowpass.poles, &lowpass.zeros, lowpass.gain).unwrap();
        bench_filter_in_place(&mut group, "butterworth4_direct", &input, direct);

        // Same design as two biquad sections
        let sections = BiquadFilter::cascade(&lowpass.poles, &lowpass.zeros, lowpass.gain).unwrap();
        bench_filter_in_place(&mut group, "butterworth4_biquads", &input, Chain::new(sections));

        // 63-tap windowed-sinc lowpass
        let fir = FirFilter::windowed(63, &[0.0, 1000.0 / (SAMPLE_RATE / 2.0)], Window::Hamming).unwrap();
        bench_filter_in_place(&mut group, "fir63_hamming", &input, fir);
    }

    group.finish();
}
