use crate::error::{Result, SynthError};
use crate::graph::node::{check_filter_io, check_span, AudioBuffer, AudioFormat, Filter, Generator, Note};

/*
Stereo Routing
==============

Three nodes that only make sense with exactly two channels:

  Ears:     a separate generator per ear
  Pan:      one generator, fixed gain per ear
  ApplyPan: a separate filter per ear

Ears and ApplyPan split the work into two mono calls. Each side sees a
one-channel format and a one-buffer slice, so anything built for mono
(including per-channel filter histories) works unchanged on either side.

  Ears(left, right):

    note ──→ [left]  ──→ channel 0
         └─→ [right] ──→ channel 1

Binaural beats are Ears with the same generator on both sides and the right
side detuned by a few Hz.
*/

fn require_stereo(format: &AudioFormat, buffers: usize, node: &'static str) -> Result<()> {
    if format.channels != 2 || buffers != 2 {
        return Err(SynthError::StereoRequired(node));
    }
    Ok(())
}

/// One generator per ear. A missing side is silent.
pub struct Ears<L, R> {
    left: Option<L>,
    right: Option<R>,
}

impl<L, R> Ears<L, R> {
    pub fn new(left: Option<L>, right: Option<R>) -> Self {
        Self { left, right }
    }
}

fn generate_side<G: Generator>(
    side: &mut Option<G>,
    format: &AudioFormat,
    note: &Note,
    num_samples: usize,
    output: &mut [AudioBuffer],
    offset: usize,
) -> Result<bool> {
    match side {
        Some(generator) => generator.generate(format, note, num_samples, output, offset),
        None => {
            output[0][offset..offset + num_samples].fill(0.0);
            Ok(false)
        }
    }
}

impl<L: Generator, R: Generator> Generator for Ears<L, R> {
    fn generate(
        &mut self,
        format: &AudioFormat,
        note: &Note,
        num_samples: usize,
        outputs: &mut [AudioBuffer],
        offset: usize,
    ) -> Result<bool> {
        require_stereo(format, outputs.len(), "ears")?;
        check_span(outputs, offset, num_samples)?;
        let mono = format.mono();
        let (left, right) = outputs.split_at_mut(1);
        let left_alive = generate_side(&mut self.left, &mono, note, num_samples, left, offset)?;
        let right_alive = generate_side(&mut self.right, &mono, note, num_samples, right, offset)?;
        Ok(left_alive || right_alive)
    }
}

/// Fixed gain per ear.
pub struct Pan<G> {
    generator: G,
    left: f64,
    right: f64,
}

impl<G> Pan<G> {
    pub fn new(generator: G, left: f64, right: f64) -> Self {
        Self {
            generator,
            left,
            right,
        }
    }
}

impl<G: Generator> Generator for Pan<G> {
    fn generate(
        &mut self,
        format: &AudioFormat,
        note: &Note,
        num_samples: usize,
        outputs: &mut [AudioBuffer],
        offset: usize,
    ) -> Result<bool> {
        require_stereo(format, outputs.len(), "pan")?;
        check_span(outputs, offset, num_samples)?;
        let alive = self
            .generator
            .generate(format, note, num_samples, outputs, offset)?;
        for (output, gain) in outputs.iter_mut().zip([self.left, self.right]) {
            for sample in &mut output[offset..offset + num_samples] {
                *sample *= gain;
            }
        }
        Ok(alive)
    }
}

/// One filter per ear. A missing side passes its channel through.
pub struct ApplyPan<L, R> {
    left: Option<L>,
    right: Option<R>,
}

impl<L, R> ApplyPan<L, R> {
    pub fn new(left: Option<L>, right: Option<R>) -> Self {
        Self { left, right }
    }
}

fn filter_side<F: Filter>(
    side: &mut Option<F>,
    format: &AudioFormat,
    num_samples: usize,
    input: &[AudioBuffer],
    offset_in: usize,
    output: &mut [AudioBuffer],
    offset_out: usize,
) -> Result<()> {
    match side {
        Some(filter) => filter.filter(format, num_samples, input, offset_in, output, offset_out),
        None => {
            output[0][offset_out..offset_out + num_samples]
                .copy_from_slice(&input[0][offset_in..offset_in + num_samples]);
            Ok(())
        }
    }
}

impl<L: Filter, R: Filter> Filter for ApplyPan<L, R> {
    fn filter(
        &mut self,
        format: &AudioFormat,
        num_samples: usize,
        inputs: &[AudioBuffer],
        offset_in: usize,
        outputs: &mut [AudioBuffer],
        offset_out: usize,
    ) -> Result<()> {
        require_stereo(format, outputs.len(), "apply_pan")?;
        check_filter_io(format, num_samples, inputs, offset_in, outputs, offset_out)?;
        let mono = format.mono();
        let (left_out, right_out) = outputs.split_at_mut(1);
        filter_side(&mut self.left, &mono, num_samples, &inputs[..1], offset_in, left_out, offset_out)?;
        filter_side(&mut self.right, &mono, num_samples, &inputs[1..], offset_in, right_out, offset_out)
    }
}
