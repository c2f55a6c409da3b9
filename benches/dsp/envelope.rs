//! Benchmarks for ADSR gain evaluation and enveloped note writing.

use std::hint::black_box;
use std::rc::Rc;

use criterion::{BenchmarkId, Criterion};
use patchsynth::graph::envelope::{Adsr, Envelope};
use patchsynth::graph::node::{silent_buffers, AudioFormat, Note};
use patchsynth::graph::oscillator::Dc;
use patchsynth::synth::Instrument;

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_envelope(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/envelope");
    let format = AudioFormat::new(SAMPLE_RATE, 1);
    let adsr = Adsr::new(0.01, 0.01, 0.7, 0.05);

    for &size in BLOCK_SIZES {
        // Attack phase (ramping up), starting at the note onset
        group.bench_with_input(BenchmarkId::new("attack", size), &size, |b, &size| {
            b.iter(|| (0..size).map(|idx| adsr.gain(black_box(&format), idx, usize::MAX)).sum::<f64>())
        });

        // Sustain phase (holding steady), well past attack and decay
        group.bench_with_input(BenchmarkId::new("sustain", size), &size, |b, &size| {
            b.iter(|| {
                (10_000..10_000 + size)
                    .map(|idx| adsr.gain(black_box(&format), idx, usize::MAX))
                    .sum::<f64>()
            })
        });

        // Release phase (ramping down) after a note of 10_000 samples
        group.bench_with_input(BenchmarkId::new("release", size), &size, |b, &size| {
            b.iter(|| {
                (10_000..10_000 + size)
                    .map(|idx| adsr.gain(black_box(&format), idx, 10_000))
                    .sum::<f64>()
            })
        });

        // Whole note through an instrument: render, envelope, mix
        let mut instrument = Instrument::new(Box::new(Dc::new(1.0))).with_envelope(Rc::new(adsr));
        let mut buffers = silent_buffers(1, size);
        let note = Note::new(69.0, 1.0, 0.0, size as f64);
        group.bench_with_input(BenchmarkId::new("write_note", size), &size, |b, _| {
            b.iter(|| {
                instrument
                    .write_note(black_box(&format), black_box(&note), &mut buffers)
                    .unwrap();
            })
        });
    }

    group.finish();
}
