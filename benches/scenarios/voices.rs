//! Benchmarks for complete patches and voice measures.
//!
//! Patches are built through the JSON builder, exactly as a caller would
//! load them, from a plain tone to a chorused stereo pluck.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use patchsynth::graph::node::{silent_buffers, Generator, Note};
use patchsynth::patch::{Builder, ComponentTable};
use patchsynth::SynthConfig;
use serde_json::{json, Value};

use crate::BLOCK_SIZES;

fn patches() -> Vec<(&'static str, Value)> {
    vec![
        // === SIMPLE TONE ===
        // sine through a gain stage, the baseline cost of one node chain
        ("sine_scaled", json!({
            "type": "apply",
            "generator": {"type": "sin"},
            "filter": {"type": "scale", "scale": 0.5}
        })),
        // === SUBTRACTIVE LEAD ===
        // supersaw → degree-4 Butterworth biquad cascade
        ("supersaw_lowpass", json!({
            "type": "apply",
            "generator": {"type": "supersaw", "detunes": [0.99, 0.995, 1.0, 1.005, 1.01]},
            "filter": {"type": "design_iir", "prototype": "BUTTERWORTH", "degree": 4, "cutoff": "2500/44100"}
        })),
        // === BINAURAL BEAT ===
        // two sines, one detuned by 6 Hz, one per ear
        ("binbeat", json!({"type": "binbeat", "frequency": 6, "generator": {"type": "sin"}})),
        // === CHORUSED PAD ===
        // saw → three-voice chorus, panned
        ("saw_chorus", json!({
            "type": "pan", "left": 0.8, "right": 0.6,
            "generator": {
                "type": "apply",
                "generator": {"type": "saw"},
                "filter": {"type": "chorus", "frequency": 0.5, "depth": 80, "size": 3}
            }
        })),
        // === SHARED REFERENCE ===
        // one named node played through both ears via a copy
        ("copy_ears", json!({
            "type": "ears",
            "left": {"type": "sin", "name": "A"},
            "right": {"type": "copy_generator", "copies": "A"}
        })),
    ]
}

pub fn bench_voices(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/voices");
    let table = ComponentTable::standard();
    let config = SynthConfig::seeded(7);
    let format = config.format();
    let builder = Builder::new(&table, &config);
    let note = Note::new(57.0, 0.8, 0.0, f64::INFINITY); // A3

    for &size in BLOCK_SIZES {
        let mut buffers = silent_buffers(config.channels, size);

        for (name, patch) in patches() {
            let (mut generator, _) = builder.build_generator(&patch).unwrap();
            group.bench_with_input(BenchmarkId::new(name, size), &size, |b, &size| {
                b.iter(|| {
                    generator
                        .generate(black_box(&format), black_box(&note), size, &mut buffers, 0)
                        .unwrap();
                })
            });
        }

        // === PLUCKED ARPEGGIO ===
        // a whole measure: Karplus-Strong notes with an envelope tail
        let mut voice = builder
            .build_voice(&json!({
                "instrument": {
                    "instrument": {"type": "pluck", "generator": {"type": "noise"}, "decay": [0.995]},
                    "envelope": {"type": "adsr", "attack": 0.0, "decay": 0.0, "sustain": 1.0, "release": 0.001}
                },
                "type": "ARPEGGIO",
                "speed": 4,
                "scale": "E3m"
            }))
            .unwrap();
        group.bench_with_input(BenchmarkId::new("arpeggio_measure", size), &size, |b, _| {
            b.iter(|| {
                voice.write_measure(black_box(&format), &mut buffers).unwrap();
            })
        });
    }

    group.finish();
}
