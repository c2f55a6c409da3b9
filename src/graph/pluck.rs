use rand::Rng;

use crate::config::SynthRng;
use crate::error::Result;
use crate::graph::node::{check_span, AudioBuffer, AudioFormat, Generator, Note};

/*
Karplus-Strong Plucked String
=============================

A burst of excitation is fed around a delay line one period long, and each
trip around the loop is smoothed a little. The smoothing eats the high
harmonics first, so the tone starts bright and mellows like a real string.

  1. period = sample_rate / frequency (fractional)
  2. The first ceil(period) samples come from the impulse generator
     (noise gives a guitar, a saw gives something harder)
  3. Every later sample reads the buffer one period back, interpolating
     between the two neighbouring taps:

       y[i] = lerp(y[⌊i - period⌋], y[⌊i - period⌋ + 1])

  4. With probability 1/stretch(f), the read is instead averaged with the
     tap one further ahead and scaled by decay(f). This is the loop's
     lowpass. Larger stretch means fewer averaging steps and a longer ring.
  5. With probability `drum`, an averaged sample also flips sign, which
     turns the string into a snare-like noise burst.

Curves:
-------
`decay` and `stretch` are functions of the note frequency so high notes can
die faster than low ones. Both default to the constant 1.

The whole string is rendered inside one call: the delay line is the output
span itself, so no state survives between calls except the random source.
*/

/// Function of the note frequency in Hz.
pub type Curve = Box<dyn Fn(f64) -> f64>;

pub struct KarplusStrong<G> {
    impulse: G,
    decay: Curve,
    stretch: Curve,
    drum: f64,
    rng: SynthRng,
}

impl<G> KarplusStrong<G> {
    pub fn new(impulse: G, rng: SynthRng) -> Self {
        Self {
            impulse,
            decay: Box::new(|_| 1.0),
            stretch: Box::new(|_| 1.0),
            drum: 0.0,
            rng,
        }
    }

    pub fn with_decay(mut self, decay: Curve) -> Self {
        self.decay = decay;
        self
    }

    pub fn with_stretch(mut self, stretch: Curve) -> Self {
        self.stretch = stretch;
        self
    }

    pub fn with_drum(mut self, drum: f64) -> Self {
        self.drum = drum;
        self
    }
}

impl<G: Generator> Generator for KarplusStrong<G> {
    fn generate(
        &mut self,
        format: &AudioFormat,
        note: &Note,
        num_samples: usize,
        outputs: &mut [AudioBuffer],
        offset: usize,
    ) -> Result<bool> {
        check_span(outputs, offset, num_samples)?;
        let frequency = note.frequency();
        if !(frequency > 0.0 && frequency.is_finite()) {
            for output in outputs.iter_mut() {
                output[offset..offset + num_samples].fill(0.0);
            }
            return Ok(true);
        }

        let period = format.sample_rate / frequency;
        let seed_len = (period.ceil() as usize).min(num_samples);
        self.impulse
            .generate(format, note, seed_len, outputs, offset)?;

        let decay = (self.decay)(frequency);
        let blend_above = 1.0 - 1.0 / (self.stretch)(frequency);

        for i in seed_len..num_samples {
            let read = i as f64 - period;
            let base = read.floor().max(0.0) as usize;
            let fraction = read - base as f64;
            // Taps never run ahead of what has been written
            let tap = |buffer: &[f64], k: usize| buffer[k.min(i - 1)];

            for output in outputs.iter_mut() {
                let string = &mut output[offset..offset + num_samples];
                let first = tap(string, base);
                let second = tap(string, base + 1);
                let lerp0 = first + (second - first) * fraction;

                let value = if self.rng.gen::<f64>() >= blend_above {
                    let third = tap(string, base + 2);
                    let lerp1 = second + (third - second) * fraction;
                    let blended = (lerp0 + lerp1) / 2.0 * decay;
                    if self.rng.gen::<f64>() < self.drum {
                        -blended
                    } else {
                        blended
                    }
                } else {
                    lerp0
                };
                string[i] = value;
            }
        }
        Ok(true)
    }
}
