use crate::error::Result;
use crate::graph::node::{check_span, zeroed_scratch, AudioBuffer, AudioFormat, Generator, Note};

/*
Parallel Signal Mixing
======================

Addition renders two generators for the same note and sums them sample by
sample:

  1. Render left into a scratch buffer set
  2. Render right straight into the output
  3. output += scratch

  [Left]  ──┬──→ (+) ──→ output
  [Right] ──┘

No weighting happens here. To blend at other levels, put a NoteModifier with
a volume scale on either side (this is what "monobeat" does: both halves at
half volume, one detuned by a few Hz).

Two phase sources added together before a shaper give phase modulation:

  sin(Linear + Oscillator::sine(modulator phase))

The note stays alive while either side is alive.
*/

pub struct Addition<L, R> {
    left: L,
    right: R,
    scratch: Vec<AudioBuffer>,
}

impl<L, R> Addition<L, R> {
    pub fn new(left: L, right: R) -> Self {
        Self {
            left,
            right,
            scratch: Vec::new(),
        }
    }
}

impl<L: Generator, R: Generator> Generator for Addition<L, R> {
    fn generate(
        &mut self,
        format: &AudioFormat,
        note: &Note,
        num_samples: usize,
        outputs: &mut [AudioBuffer],
        offset: usize,
    ) -> Result<bool> {
        check_span(outputs, offset, num_samples)?;
        let scratch = zeroed_scratch(&mut self.scratch, outputs.len(), num_samples);
        let left_alive = self.left.generate(format, note, num_samples, scratch, 0)?;
        let right_alive = self.right.generate(format, note, num_samples, outputs, offset)?;

        for (output, left) in outputs.iter_mut().zip(scratch.iter()) {
            for (o, l) in output[offset..offset + num_samples].iter_mut().zip(left) {
                *o += *l;
            }
        }
        Ok(left_alive || right_alive)
    }
}
