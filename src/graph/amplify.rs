use crate::error::Result;
use crate::graph::node::{check_span, zeroed_scratch, AudioBuffer, AudioFormat, Generator, Note};

/// Sample-wise product of two generators (ring or amplitude modulation).
///
/// Left renders into scratch space, right into the output, then the output
/// is multiplied by the scratch. Alive while either side is alive.
pub struct Multiplication<L, R> {
    left: L,
    right: R,
    scratch: Vec<AudioBuffer>,
}

impl<L, R> Multiplication<L, R> {
    pub fn new(left: L, right: R) -> Self {
        Self {
            left,
            right,
            scratch: Vec::new(),
        }
    }
}

impl<L: Generator, R: Generator> Generator for Multiplication<L, R> {
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

        // Multiply signal by modulator
        for (output, left) in outputs.iter_mut().zip(scratch.iter()) {
            for (o, l) in output[offset..offset + num_samples].iter_mut().zip(left) {
                *o *= *l;
            }
        }
        Ok(left_alive || right_alive)
    }
}
