use std::f64::consts::TAU;

use crate::error::Result;
use crate::graph::node::{check_span, zeroed_scratch, AudioBuffer, AudioFormat, Generator, Note};

/*
SuperSaw
========

A stack of detuned sawtooths sharing one phase source. For each detune
ratio d with weight w:

    saw_d = (phase · d / 2π) mod 1 - 0.5

and the output is

    2 · volume / Σw · Σ w · saw_d

Ratios close to 1.0 (0.99, 1.0, 1.01, ...) give the classic thick, beating
trance lead. The child renders once; every saw reads the same phase, so the
stack costs one child render plus a few multiplies per voice.
*/

pub struct SuperSaw<G> {
    phase: G,
    detunes: Vec<f64>,
    weights: Vec<f64>,
    scratch: Vec<AudioBuffer>,
}

impl<G> SuperSaw<G> {
    /// When `weights` does not match `detunes` in length every saw gets an
    /// equal share.
    pub fn new(phase: G, detunes: Vec<f64>, weights: Vec<f64>) -> Self {
        let weights = if weights.len() == detunes.len() {
            weights
        } else {
            let share = 1.0 / detunes.len().max(1) as f64;
            vec![share; detunes.len()]
        };
        Self {
            phase,
            detunes,
            weights,
            scratch: Vec::new(),
        }
    }
}

impl<G: Generator> Generator for SuperSaw<G> {
    fn generate(
        &mut self,
        format: &AudioFormat,
        note: &Note,
        num_samples: usize,
        outputs: &mut [AudioBuffer],
        offset: usize,
    ) -> Result<bool> {
        check_span(outputs, offset, num_samples)?;
        let phase = zeroed_scratch(&mut self.scratch, outputs.len(), num_samples);
        let alive = self.phase.generate(format, note, num_samples, phase, 0)?;

        let total: f64 = self.weights.iter().sum();
        if total == 0.0 {
            log::warn!("supersaw weights sum to zero, writing silence");
            for output in outputs.iter_mut() {
                output[offset..offset + num_samples].fill(0.0);
            }
            return Ok(alive);
        }
        let norm = 2.0 * note.volume / total;

        for (output, phase) in outputs.iter_mut().zip(phase.iter()) {
            for (o, &p) in output[offset..offset + num_samples].iter_mut().zip(phase) {
                let stacked: f64 = self
                    .detunes
                    .iter()
                    .zip(&self.weights)
                    .map(|(d, w)| w * ((p * d / TAU) % 1.0 - 0.5))
                    .sum();
                *o = stacked * norm;
            }
        }
        Ok(alive)
    }
}
