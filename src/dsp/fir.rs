use std::f64::consts::PI;

use crate::dsp::sized_histories;
use crate::dsp::window::Window;
use crate::error::{Result, SynthError};
use crate::graph::node::{check_channels, check_filter_io, check_span, AudioBuffer, AudioFormat, Filter};

/// Normalised sinc, `sin(πx) / πx`.
pub fn sinc(x: f64) -> f64 {
    if x == 0.0 {
        1.0
    } else {
        (PI * x).sin() / (PI * x)
    }
}

/// Direct convolution against a fixed coefficient vector.
pub struct FirFilter {
    coefficients: Vec<f64>,
    history: Vec<Vec<f64>>,
    history_idx: usize,
}

impl FirFilter {
    pub fn new(coefficients: Vec<f64>) -> Result<Self> {
        if coefficients.is_empty() {
            return Err(SynthError::InvalidField {
                component: "fir".to_string(),
                field: "coefficients",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(Self {
            coefficients,
            history: Vec::new(),
            history_idx: 0,
        })
    }

    /// Windowed-sinc design with `degree` taps.
    ///
    /// `bands` holds `(left, right)` passband edges flattened into one list,
    /// each a fraction of Nyquist in `[0, 1]`. Coefficients are rescaled for
    /// unity gain at DC when the first band starts at 0, at Nyquist when the
    /// last band ends at 1, and at the centre of the first band otherwise.
    pub fn windowed(degree: usize, bands: &[f64], window: Window) -> Result<Self> {
        let invalid = |reason: String| SynthError::InvalidField {
            component: "firwin".to_string(),
            field: "bands",
            reason,
        };
        if bands.is_empty() || bands.len() % 2 != 0 {
            return Err(invalid(format!("needs an even, non-zero number of edges, got {}", bands.len())));
        }
        if degree == 0 {
            return Err(invalid("degree must be at least 1".to_string()));
        }

        let center = (degree as f64 - 1.0) / 2.0;
        let mut coefficients = vec![0.0; degree];
        for band in bands.chunks_exact(2) {
            let (left, right) = (band[0], band[1]);
            for (j, c) in coefficients.iter_mut().enumerate() {
                let x = j as f64 - center;
                *c += right * sinc(right * x) - left * sinc(left * x);
            }
        }
        for (j, c) in coefficients.iter_mut().enumerate() {
            *c *= window.weight(j, degree);
        }

        let target = if bands[0] == 0.0 {
            0.0
        } else if bands[bands.len() - 1] == 1.0 {
            1.0
        } else {
            (bands[0] + bands[1]) / 2.0
        };
        let scale: f64 = coefficients
            .iter()
            .enumerate()
            .map(|(j, c)| c * (PI * (j as f64 - center) * target).cos())
            .sum();
        if scale == 0.0 || !scale.is_finite() {
            log::warn!("firwin response at {target} of Nyquist is {scale}, leaving coefficients unscaled");
        } else {
            for c in coefficients.iter_mut() {
                *c /= scale;
            }
        }
        log::debug!("firwin {window:?} coefficients {coefficients:?}");
        Self::new(coefficients)
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    fn prepare(&mut self, channels: usize) -> Result<()> {
        sized_histories(&mut self.history, channels, self.coefficients.len() - 1)
    }

    #[inline]
    fn step(&mut self, channel: usize, x: f64) -> f64 {
        let len = self.coefficients.len() - 1;
        let history = &mut self.history[channel];
        let mut y = x * self.coefficients[0];
        for k in 1..=len {
            y += self.coefficients[k] * history[(self.history_idx + len - k) % len];
        }
        if len > 0 {
            history[self.history_idx] = x;
        }
        y
    }

    #[inline]
    fn advance(&mut self) {
        let len = self.coefficients.len() - 1;
        if len > 0 {
            self.history_idx = (self.history_idx + 1) % len;
        }
    }
}

impl Filter for FirFilter {
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
        self.prepare(format.channels)?;
        for i in 0..num_samples {
            for (channel, (input, output)) in inputs.iter().zip(outputs.iter_mut()).enumerate() {
                output[offset_out + i] = self.step(channel, input[offset_in + i]);
            }
            self.advance();
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
        self.prepare(format.channels)?;
        for i in offset..offset + num_samples {
            for (channel, buffer) in buffers.iter_mut().enumerate() {
                buffer[i] = self.step(channel, buffer[i]);
            }
            self.advance();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_boxcar_degree_four() {
        let bands = [0.0, 440.0 / 22_050.0, 1000.0 / 22_050.0, 8000.0 / 22_050.0];
        let filter = FirFilter::windowed(4, &bands, Window::Boxcar).unwrap();
        let expected = [0.18390088, 0.31609912, 0.31609912, 0.18390088];
        for (c, e) in filter.coefficients().iter().zip(expected) {
            assert_approx_eq!(c, e, 1e-6);
        }
    }

    #[test]
    fn test_lowpass_design_has_unit_dc_gain() {
        let filter = FirFilter::windowed(31, &[0.0, 0.25], Window::Hamming).unwrap();
        let dc: f64 = filter.coefficients().iter().sum();
        assert_approx_eq!(dc, 1.0, 1e-12);

        // Linear phase: symmetric taps
        let c = filter.coefficients();
        for j in 0..c.len() / 2 {
            assert_approx_eq!(c[j], c[c.len() - 1 - j], 1e-12);
        }
    }

    #[test]
    fn test_odd_band_count_is_rejected() {
        assert!(matches!(
            FirFilter::windowed(4, &[0.0, 0.2, 0.4], Window::Boxcar),
            Err(SynthError::InvalidField { field: "bands", .. })
        ));
    }

    #[test]
    fn test_zero_response_skips_rescale() {
        // An empty band has zero response everywhere
        let filter = FirFilter::windowed(4, &[0.0, 0.0], Window::Boxcar).unwrap();
        assert!(filter.coefficients().iter().all(|c| *c == 0.0));
    }

    #[test]
    fn test_convolution_across_calls() {
        let format = AudioFormat::new(8_000.0, 1);
        let mut filter = FirFilter::new(vec![1.0, 2.0, 3.0]).unwrap();

        let mut first = vec![vec![1.0, 0.0]];
        filter.filter_in_place(&format, 2, &mut first, 0).unwrap();
        assert_eq!(first[0], vec![1.0, 2.0]);

        let mut second = vec![vec![0.0, 0.0]];
        filter.filter_in_place(&format, 2, &mut second, 0).unwrap();
        assert_eq!(second[0], vec![3.0, 0.0]);
    }
}
