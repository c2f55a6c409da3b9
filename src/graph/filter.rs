use crate::error::Result;
use crate::graph::node::{
    check_channels, check_filter_io, check_span, zeroed_scratch, AudioBuffer, AudioFormat, Filter,
};

/*
Filter Combinators
==================

| node      | shape                 | output                          |
| --------- | --------------------- | ------------------------------- |
| Chain     | f1 → f2 → ... (serial) | fN(...f2(f1(x)))               |
| ApplyEach | f1, f2, ... (parallel) | f1(x) + f2(x) + ...            |
| Scale     | single gain           | g · x                           |

Chain copies its input to the output once and then runs every stage in
place on the output span. A biquad cascade from `design_iir` is a Chain of
second-order sections.

ApplyEach hands every branch the same untouched input and sums the branch
outputs, so a bandstop can be built as lowpass + highpass in parallel.
*/

/// Serial filters, each running in place on the previous one's output.
pub struct Chain<F> {
    filters: Vec<F>,
}

impl<F> Chain<F> {
    pub fn new(filters: Vec<F>) -> Self {
        Self { filters }
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl<F: Filter> Filter for Chain<F> {
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
        for (input, output) in inputs.iter().zip(outputs.iter_mut()) {
            output[offset_out..offset_out + num_samples]
                .copy_from_slice(&input[offset_in..offset_in + num_samples]);
        }
        self.filter_in_place(format, num_samples, outputs, offset_out)
    }

    fn filter_in_place(
        &mut self,
        format: &AudioFormat,
        num_samples: usize,
        buffers: &mut [AudioBuffer],
        offset: usize,
    ) -> Result<()> {
        for filter in self.filters.iter_mut() {
            filter.filter_in_place(format, num_samples, buffers, offset)?;
        }
        Ok(())
    }
}

/// Parallel filters over the same input, summed.
pub struct ApplyEach<F> {
    filters: Vec<F>,
    branch: Vec<AudioBuffer>,
    sum: Vec<AudioBuffer>,
}

impl<F> ApplyEach<F> {
    pub fn new(filters: Vec<F>) -> Self {
        Self {
            filters,
            branch: Vec::new(),
            sum: Vec::new(),
        }
    }
}

impl<F: Filter> Filter for ApplyEach<F> {
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
        let channels = inputs.len();
        let sum = zeroed_scratch(&mut self.sum, channels, num_samples);
        for filter in self.filters.iter_mut() {
            let branch = zeroed_scratch(&mut self.branch, channels, num_samples);
            filter.filter(format, num_samples, inputs, offset_in, branch, 0)?;
            for (total, part) in sum.iter_mut().zip(branch.iter()) {
                for (t, p) in total.iter_mut().zip(part) {
                    *t += *p;
                }
            }
        }
        for (output, total) in outputs.iter_mut().zip(sum.iter()) {
            output[offset_out..offset_out + num_samples].copy_from_slice(total);
        }
        Ok(())
    }
}

/// Constant gain.
#[derive(Debug, Clone, Copy)]
pub struct Scale {
    gain: f64,
}

impl Scale {
    pub fn new(gain: f64) -> Self {
        Self { gain }
    }
}

impl Filter for Scale {
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
        for (input, output) in inputs.iter().zip(outputs.iter_mut()) {
            let source = &input[offset_in..offset_in + num_samples];
            for (o, i) in output[offset_out..offset_out + num_samples].iter_mut().zip(source) {
                *o = i * self.gain;
            }
        }
        Ok(())
    }

    fn filter_in_place(
        &mut self,
        format: &AudioFormat,
        num_samples: usize,
        buffers: &mut [AudioBuffer],
        offset: usize,
    ) -> Result<()> {
        check_channels(format, buffers)?;
        check_span(buffers, offset, num_samples)?;
        for buffer in buffers.iter_mut() {
            for sample in &mut buffer[offset..offset + num_samples] {
                *sample *= self.gain;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::fir::FirFilter;
    use crate::graph::node::silent_buffers;

    fn mono() -> AudioFormat {
        AudioFormat::new(44_100.0, 1)
    }

    #[test]
    fn test_chain_runs_in_order() {
        // (x * 2) delayed by one sample, then * 3
        let mut chain: Chain<Box<dyn Filter>> = Chain::new(vec![
            Box::new(Scale::new(2.0)),
            Box::new(FirFilter::new(vec![0.0, 1.0]).unwrap()),
            Box::new(Scale::new(3.0)),
        ]);
        let input = vec![vec![1.0, 2.0, 3.0]];
        let mut output = silent_buffers(1, 3);
        chain.filter(&mono(), 3, &input, 0, &mut output, 0).unwrap();
        assert_eq!(output[0], vec![0.0, 6.0, 12.0]);
    }

    #[test]
    fn test_empty_chain_copies() {
        let mut chain: Chain<Scale> = Chain::new(Vec::new());
        assert!(chain.is_empty());
        let input = vec![vec![0.0, 0.5, 1.0, 1.5]];
        let mut output = vec![vec![9.0; 6]];
        chain.filter(&mono(), 2, &input, 2, &mut output, 1).unwrap();
        assert_eq!(output[0], vec![9.0, 1.0, 1.5, 9.0, 9.0, 9.0]);
    }

    #[test]
    fn test_each_sums_branches_of_same_input() {
        let mut each = ApplyEach::new(vec![Scale::new(0.5), Scale::new(0.25), Scale::new(-1.0)]);
        let mut buffers = vec![vec![4.0, 8.0]];
        each.filter_in_place(&mono(), 2, &mut buffers, 0).unwrap();
        assert_eq!(buffers[0], vec![-1.0, -2.0]);
    }

    #[test]
    fn test_scale_rejects_wrong_channel_count() {
        let mut scale = Scale::new(1.0);
        let mut buffers = silent_buffers(2, 4);
        assert!(scale.filter_in_place(&mono(), 4, &mut buffers, 0).is_err());
    }
}
