use crate::error::Result;
use crate::graph::node::{AudioBuffer, AudioFormat, Filter, Generator, Note};

/*
Serial Signal Chain (Through)
=============================

Through connects a generator to a filter in series: the generator renders
into the output span, then the filter processes that span in place.

  [Generator] ──→ [Filter] ──→ output

  Generator renders:  [0.5, 0.8, -0.3, 0.9, ...]
  Filter in place:    [0.4, 0.6, -0.2, 0.7, ...]

This is the "apply" component of a patch and what `.through()` builds:

  Oscillator::saw(Linear::new())
      .through(chain_of_biquads)
      .through(chorus)

Through vs Multiplication vs Addition:
--------------------------------------
- Through:        serial processing (source → filter → output)
- Multiplication: product of two generators (signal × modulator)
- Addition:       sum of two generators

Liveness is the generator's; filters have no say in when a note ends.
*/

pub struct Through<G, F> {
    generator: G,
    filter: F,
}

impl<G, F> Through<G, F> {
    pub fn new(generator: G, filter: F) -> Self {
        Self { generator, filter }
    }
}

impl<G: Generator, F: Filter> Generator for Through<G, F> {
    fn generate(
        &mut self,
        format: &AudioFormat,
        note: &Note,
        num_samples: usize,
        outputs: &mut [AudioBuffer],
        offset: usize,
    ) -> Result<bool> {
        let alive = self
            .generator
            .generate(format, note, num_samples, outputs, offset)?;
        self.filter
            .filter_in_place(format, num_samples, outputs, offset)?;
        Ok(alive)
    }
}
