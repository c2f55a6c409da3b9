use std::f64::consts::TAU;

use crate::dsp::sized_histories;
use crate::error::{Result, SynthError};
use crate::graph::node::{check_filter_io, AudioBuffer, AudioFormat, Filter};

/*
LFO-Modulated Delay
===================

A delay line whose length swings sinusoidally between 0 and `depth`
samples. On its own it gives vibrato; mixed with the dry signal (see
Chorus) it gives chorus and flanging.

Read Position:
--------------

For output sample i (phase counted in samples since the first call):

  z = i + depth · (sin(2π · (phase + i) · frequency / sample_rate) - 1) / 2

so z sweeps [i - depth, i]. The sample at z is linearly interpolated from
the two neighbouring input samples:

  x0 = x[⌊z⌋],  x1 = x[⌊z⌋ + 1],  y = x0 + (x1 - x0) · (z - ⌊z⌋)

Carrying the Tail:
------------------

Negative read positions reach into the previous call. Each channel keeps a
cache of the last ceil(depth) input samples; index -k reads cache[len - k].
After every call the cache is refilled from (old cache ++ this input), so
the delay is seamless across chunk boundaries, even when a chunk is shorter
than the cache.
*/

/// Longest delay line, in samples (about 24 s at 44.1 kHz).
pub const MAX_DEPTH: f64 = 1_048_576.0;

/// Depth clamped below at zero; non-finite or over [`MAX_DEPTH`] is an error.
pub fn checked_depth(component: &str, field: &'static str, depth: f64) -> Result<f64> {
    if !depth.is_finite() || depth > MAX_DEPTH {
        return Err(SynthError::InvalidField {
            component: component.to_string(),
            field,
            reason: format!("depth must be finite and at most {MAX_DEPTH} samples, got {depth}"),
        });
    }
    Ok(depth.max(0.0))
}

pub struct LfoDelay {
    frequency: f64,
    depth: f64,
    phase: f64,
    cache: Vec<Vec<f64>>,
    joined: Vec<f64>,
}

impl LfoDelay {
    /// `frequency` in Hz, `depth` in samples.
    pub fn new(frequency: f64, depth: f64) -> Result<Self> {
        Ok(Self {
            frequency,
            depth: checked_depth("lfo_delay", "depth", depth)?,
            phase: 0.0,
            cache: Vec::new(),
            joined: Vec::new(),
        })
    }

    fn cache_len(&self) -> usize {
        self.depth.ceil() as usize
    }

    #[inline]
    fn read_position(&self, format: &AudioFormat, i: usize) -> f64 {
        let lfo = (TAU * (self.phase + i as f64) * self.frequency / format.sample_rate).sin();
        i as f64 + self.depth * (lfo - 1.0) / 2.0
    }
}

/// Interpolated read at `z`, where negative indices fall in `cache`.
fn lerp(cache: &[f64], input: &[f64], z: f64) -> f64 {
    let sample = |idx: i64| {
        if idx < 0 {
            cache[(cache.len() as i64 + idx) as usize]
        } else {
            input[idx as usize]
        }
    };
    let idx0 = z.floor() as i64;
    let x0 = sample(idx0);
    let fraction = z - idx0 as f64;
    if fraction.abs() < 1e-9 {
        return x0;
    }
    let x1 = sample(idx0 + 1);
    x0 + (x1 - x0) * fraction
}

impl Filter for LfoDelay {
    fn filter(
        &mut self,
        format: &AudioFormat,
        num_samples: usize,
        inputs: &[AudioBuffer],
        offset_in: usize,
        outputs: &mut [AudioBuffer],
        offset_out: usize,
    ) -> Result<()> {
        check_filter_io(format, num_samples, inputs, offset_in, outputs, offset_out)?;
        let cache_len = self.cache_len();
        sized_histories(&mut self.cache, format.channels, cache_len)?;

        for i in 0..num_samples {
            let z = self.read_position(format, i);
            for ((cache, input), output) in self.cache.iter().zip(inputs).zip(outputs.iter_mut()) {
                let span = &input[offset_in..offset_in + num_samples];
                output[offset_out + i] = lerp(cache, span, z);
            }
        }

        for (cache, input) in self.cache.iter_mut().zip(inputs) {
            self.joined.clear();
            self.joined.extend_from_slice(cache);
            self.joined
                .extend_from_slice(&input[offset_in..offset_in + num_samples]);
            let tail = self.joined.len() - cache_len;
            cache.copy_from_slice(&self.joined[tail..]);
        }

        self.phase += num_samples as f64;
        Ok(())
    }
}
