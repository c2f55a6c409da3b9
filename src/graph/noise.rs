use rand::Rng;

use crate::config::SynthRng;
use crate::error::Result;
use crate::graph::node::{check_span, AudioBuffer, AudioFormat, Generator, Note};

/// Uniform white noise in `[-volume, volume]`.
///
/// Gated by the note's `[start, duration)` window against its own elapsed
/// sample counter, like [Linear](crate::graph::oscillator::Linear). Every
/// channel draws independently.
pub struct WhiteNoise {
    rng: SynthRng,
    elapsed: f64,
}

impl WhiteNoise {
    pub fn new(rng: SynthRng) -> Self {
        Self { rng, elapsed: 0.0 }
    }
}

impl Generator for WhiteNoise {
    fn generate(
        &mut self,
        _format: &AudioFormat,
        note: &Note,
        num_samples: usize,
        outputs: &mut [AudioBuffer],
        offset: usize,
    ) -> Result<bool> {
        check_span(outputs, offset, num_samples)?;
        for i in 0..num_samples {
            let sounding = note.sounding_at(self.elapsed + i as f64);
            for output in outputs.iter_mut() {
                output[offset + i] = if sounding {
                    self.rng.gen_range(-1.0..1.0) * note.volume
                } else {
                    0.0
                };
            }
        }
        self.elapsed += num_samples as f64;
        Ok(self.elapsed < note.duration)
    }
}
