use crate::error::{Result, SynthError};
use crate::graph::delay::{checked_depth, LfoDelay};
use crate::graph::node::{check_filter_io, zeroed_scratch, AudioBuffer, AudioFormat, Filter};

/*
Chorus Effect
=============

Chorus thickens a sound by summing several copies of it, each through its
own LFO-modulated delay. As each delay time drifts the copy's pitch bends
slightly up and down, so one voice sounds like several playing together.

  x ──┬──→ [LfoDelay f1, d1] ──→ ×w1 ──┐
      ├──→ [LfoDelay f2, d2] ──→ ×w2 ──┼──→ (+) ──→ y
      └──→ [LfoDelay f3, d3] ──→ ×w3 ──┘

Weights are normalised by their sum so the chorus keeps the input's level.

Rates:
------
`uniform(frequency, depth, size)` uses harmonically related rates 0, f, 2f,
..., (size-1)·f. The first voice has a rate of zero, which is a fixed delay
of depth/2 samples standing in for the dry signal.

Depths are in samples: at 44.1 kHz a depth of 200 gives ~4.5 ms, an obvious
chorus; 40-80 is a subtle shimmer.
*/

pub struct Chorus {
    voices: Vec<(f64, LfoDelay)>,
    wet: Vec<AudioBuffer>,
    sum: Vec<AudioBuffer>,
}

impl Chorus {
    /// Voices as `(frequency, depth, weight)`.
    pub fn new(voices: &[(f64, f64, f64)]) -> Result<Self> {
        let total: f64 = voices.iter().map(|(_, _, weight)| weight).sum();
        if total == 0.0 || !total.is_finite() {
            return Err(SynthError::InvalidField {
                component: "chorus".to_string(),
                field: "delays",
                reason: format!("weights must have a non-zero sum, got {total}"),
            });
        }
        let voices: Vec<(f64, LfoDelay)> = voices
            .iter()
            .map(|&(frequency, depth, weight)| -> Result<(f64, LfoDelay)> {
                checked_depth("chorus", "delays", depth)?;
                Ok((weight / total, LfoDelay::new(frequency, depth)?))
            })
            .collect::<Result<_>>()?;
        Ok(Self {
            voices,
            wet: Vec::new(),
            sum: Vec::new(),
        })
    }

    /// `size` equally weighted voices at rates `0, frequency, 2·frequency, ...`.
    pub fn uniform(frequency: f64, depth: f64, size: usize) -> Result<Self> {
        let depth = checked_depth("chorus", "depth", depth)?;
        let voices: Vec<_> = (0..size)
            .map(|i| (frequency * i as f64, depth, 1.0))
            .collect();
        Self::new(&voices)
    }
}

impl Filter for Chorus {
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
        let sum = zeroed_scratch(&mut self.sum, format.channels, num_samples);
        for (weight, delay) in self.voices.iter_mut() {
            let wet = zeroed_scratch(&mut self.wet, format.channels, num_samples);
            delay.filter(format, num_samples, inputs, offset_in, wet, 0)?;
            for (total, voice) in sum.iter_mut().zip(wet.iter()) {
                for (t, v) in total.iter_mut().zip(voice) {
                    *t += *v * *weight;
                }
            }
        }
        for (output, total) in outputs.iter_mut().zip(sum.iter()) {
            output[offset_out..offset_out + num_samples].copy_from_slice(total);
        }
        Ok(())
    }
}
