use crate::dsp::complex::{poly_from_roots, real_parts, Complex64, ComplexExt, NEAR_TOLERANCE};
use crate::dsp::sized_histories;
use crate::error::{Result, SynthError};
use crate::graph::node::{check_channels, check_filter_io, check_span, AudioBuffer, AudioFormat, Filter};

/*
Recursive (IIR) filters
=======================

Direct form I:

    y[n]·a0 = b0·x[n] + b1·x[n-1] + ... - a1·y[n-1] - a2·y[n-2] - ...

Each channel keeps `len(b) - 1` past inputs and `len(a) - 1` past outputs in
ring buffers that share one write index per ring across channels.

A BiquadFilter is the 2-pole/2-zero case with two history slots that swap
roles every sample. Higher-order designs are usually split into a cascade of
biquads, which stays numerically stable where a single high-order
recurrence drifts.
*/

pub struct IirFilter {
    denominator: Vec<f64>,
    numerator: Vec<f64>,
    input_history: Vec<Vec<f64>>,
    output_history: Vec<Vec<f64>>,
    input_idx: usize,
    output_idx: usize,
}

impl IirFilter {
    pub fn new(denominator: Vec<f64>, numerator: Vec<f64>) -> Result<Self> {
        let invalid = |field: &'static str, reason: &str| SynthError::InvalidField {
            component: "iir".to_string(),
            field,
            reason: reason.to_string(),
        };
        match denominator.first() {
            None => return Err(invalid("denominator", "must not be empty")),
            Some(&a0) if a0 == 0.0 => return Err(invalid("denominator", "leading coefficient is zero")),
            Some(_) => {}
        }
        if numerator.is_empty() {
            return Err(invalid("numerator", "must not be empty"));
        }
        Ok(Self {
            denominator,
            numerator,
            input_history: Vec::new(),
            output_history: Vec::new(),
            input_idx: 0,
            output_idx: 0,
        })
    }

    /// Single recurrence with `a = poly(poles)` and `b = gain·poly(zeros)`.
    pub fn from_pzk(poles: &[Complex64], zeros: &[Complex64], gain: f64) -> Result<Self> {
        let denominator = real_parts(&poly_from_roots(poles));
        let numerator: Vec<f64> = real_parts(&poly_from_roots(zeros))
            .into_iter()
            .map(|b| b * gain)
            .collect();
        log::debug!("iir coefficients a={denominator:?} b={numerator:?}");
        Self::new(denominator, numerator)
    }

    pub fn denominator(&self) -> &[f64] {
        &self.denominator
    }

    pub fn numerator(&self) -> &[f64] {
        &self.numerator
    }

    fn prepare(&mut self, channels: usize) -> Result<()> {
        sized_histories(&mut self.input_history, channels, self.numerator.len() - 1)?;
        sized_histories(&mut self.output_history, channels, self.denominator.len() - 1)
    }

    #[inline]
    fn step(&mut self, channel: usize, x: f64) -> f64 {
        let nb = self.numerator.len() - 1;
        let na = self.denominator.len() - 1;

        let mut y = x * self.numerator[0];
        let inputs = &self.input_history[channel];
        for k in 1..=nb {
            y += self.numerator[k] * inputs[(self.input_idx + nb - k) % nb];
        }
        let outputs = &self.output_history[channel];
        for k in 1..=na {
            y -= self.denominator[k] * outputs[(self.output_idx + na - k) % na];
        }
        y /= self.denominator[0];

        if nb > 0 {
            self.input_history[channel][self.input_idx] = x;
        }
        if na > 0 {
            self.output_history[channel][self.output_idx] = y;
        }
        y
    }

    #[inline]
    fn advance(&mut self) {
        let nb = self.numerator.len() - 1;
        let na = self.denominator.len() - 1;
        if nb > 0 {
            self.input_idx = (self.input_idx + 1) % nb;
        }
        if na > 0 {
            self.output_idx = (self.output_idx + 1) % na;
        }
    }
}

impl Filter for IirFilter {
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

/// Second-order section.
pub struct BiquadFilter {
    denominator: [f64; 3],
    numerator: [f64; 3],
    input_history: Vec<[f64; 2]>,
    output_history: Vec<[f64; 2]>,
    cache_idx: usize,
}

impl Default for BiquadFilter {
    /// Identity section.
    fn default() -> Self {
        Self::new([1.0, 0.0, 0.0], [1.0, 0.0, 0.0])
    }
}

impl BiquadFilter {
    pub fn new(denominator: [f64; 3], numerator: [f64; 3]) -> Self {
        Self {
            denominator,
            numerator,
            input_history: Vec::new(),
            output_history: Vec::new(),
            cache_idx: 0,
        }
    }

    /// Section from one pole pair and one zero pair, each either both real
    /// or a conjugate pair.
    pub fn from_pzk(poles: [Complex64; 2], zeros: [Complex64; 2], gain: f64) -> Result<Self> {
        if !is_pair(&poles[0], &poles[1]) {
            return Err(SynthError::NonConjugatePair("poles"));
        }
        if !is_pair(&zeros[0], &zeros[1]) {
            return Err(SynthError::NonConjugatePair("zeros"));
        }
        let denominator = [
            1.0,
            -(poles[0] + poles[1]).re,
            (poles[0] * poles[1]).re,
        ];
        let numerator = [
            gain,
            -gain * (zeros[0] + zeros[1]).re,
            gain * (zeros[0] * zeros[1]).re,
        ];
        log::debug!("biquad coefficients a={denominator:?} b={numerator:?}");
        Ok(Self::new(denominator, numerator))
    }

    /// Split an arbitrary pole/zero set into a cascade of sections.
    ///
    /// Poles are taken in order, each with its partner (the next real pole
    /// for a real pole, its conjugate otherwise); zeros likewise. `gain`
    /// goes to the first section only. An odd leftover pole and zero are
    /// closed with a partner at the origin.
    pub fn cascade(poles: &[Complex64], zeros: &[Complex64], gain: f64) -> Result<Vec<Self>> {
        if poles.len() != zeros.len() {
            return Err(SynthError::PoleZeroCount {
                poles: poles.len(),
                zeros: zeros.len(),
            });
        }
        let mut poles = poles.to_vec();
        let mut zeros = zeros.to_vec();
        let mut sections = Vec::with_capacity((poles.len() + 1) / 2);
        let mut gain = gain;

        while poles.len() > 1 {
            let pole = poles.remove(0);
            let pole_partner = take_partner(&mut poles, &pole).ok_or(SynthError::NonConjugatePair("poles"))?;
            let zero = zeros.remove(0);
            let zero_partner = take_partner(&mut zeros, &zero).ok_or(SynthError::NonConjugatePair("zeros"))?;
            sections.push(Self::from_pzk([pole, pole_partner], [zero, zero_partner], gain)?);
            gain = 1.0;
        }
        if let (Some(&pole), Some(&zero)) = (poles.first(), zeros.first()) {
            let origin = Complex64::new(0.0, 0.0);
            sections.push(Self::from_pzk([pole, origin], [zero, origin], gain)?);
        }
        Ok(sections)
    }

    pub fn denominator(&self) -> [f64; 3] {
        self.denominator
    }

    pub fn numerator(&self) -> [f64; 3] {
        self.numerator
    }

    fn prepare(&mut self, channels: usize) -> Result<()> {
        if self.input_history.is_empty() {
            self.input_history = vec![[0.0; 2]; channels];
            self.output_history = vec![[0.0; 2]; channels];
        } else if self.input_history.len() != channels {
            return Err(SynthError::ChannelMismatch {
                expected: self.input_history.len(),
                found: channels,
            });
        }
        Ok(())
    }

    #[inline]
    fn step(&mut self, channel: usize, x: f64) -> f64 {
        let [a0, a1, a2] = self.denominator;
        let [b0, b1, b2] = self.numerator;
        let idx = self.cache_idx;
        let input = &mut self.input_history[channel];
        let output = &mut self.output_history[channel];

        let y = (x * b0 + input[idx] * b1 + input[1 - idx] * b2
            - output[idx] * a1
            - output[1 - idx] * a2)
            / a0;

        input[1 - idx] = x;
        output[1 - idx] = y;
        y
    }
}

impl Filter for BiquadFilter {
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
            self.cache_idx = 1 - self.cache_idx;
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
            self.cache_idx = 1 - self.cache_idx;
        }
        Ok(())
    }
}

fn is_pair(a: &Complex64, b: &Complex64) -> bool {
    (a.is_real() && b.is_real()) || a.conj().near(b, NEAR_TOLERANCE)
}

fn take_partner(values: &mut Vec<Complex64>, of: &Complex64) -> Option<Complex64> {
    let position = if of.is_real() {
        values.iter().position(|c| c.is_real())
    } else {
        values.iter().position(|c| c.conj().near(of, NEAR_TOLERANCE))
    }?;
    Some(values.remove(position))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::design::{digital_pzk, FilterKind, Prototype};
    use assert_approx_eq::assert_approx_eq;
    use std::f64::consts::PI;

    const A440: f64 = 2.0 * PI * 440.0 / 44_100.0;

    fn mono() -> AudioFormat {
        AudioFormat::new(44_100.0, 1)
    }

    fn sorted(mut values: Vec<f64>) -> Vec<f64> {
        values.sort_by(f64::total_cmp);
        values
    }

    fn assert_all_close(actual: &[f64], expected: &[f64], tolerance: f64) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < tolerance, "{actual:?} vs {expected:?}");
        }
    }

    #[test]
    fn test_iir_from_pzk_coefficients() {
        let pzk = digital_pzk(Prototype::Butterworth, 2, FilterKind::Lowpass, A440, None).unwrap();
        let filter = IirFilter::from_pzk(&pzk.poles, &pzk.zeros, pzk.gain).unwrap();

        assert_all_close(filter.denominator(), &[1.0, -1.9113982, 0.9151602], 1e-6);
        assert_all_close(
            filter.numerator(),
            &[9.405043e-4, 1.8810087e-3, 9.405043e-4],
            1e-9,
        );
    }

    #[test]
    fn test_iir_recurrence_by_hand() {
        // y[n] = x[n] + 0.5·y[n-1]
        let mut filter = IirFilter::new(vec![1.0, -0.5], vec![1.0]).unwrap();
        let mut buffers = vec![vec![1.0, 0.0, 0.0, 0.0]];
        filter.filter_in_place(&mono(), 4, &mut buffers, 0).unwrap();
        assert_eq!(buffers[0], vec![1.0, 0.5, 0.25, 0.125]);

        // History carries into the next call
        let mut next = vec![vec![0.0]];
        filter.filter_in_place(&mono(), 1, &mut next, 0).unwrap();
        assert_eq!(next[0][0], 0.0625);
    }

    #[test]
    fn test_iir_rejects_degenerate_coefficients() {
        assert!(IirFilter::new(vec![], vec![1.0]).is_err());
        assert!(IirFilter::new(vec![0.0, 1.0], vec![1.0]).is_err());
        assert!(IirFilter::new(vec![1.0], vec![]).is_err());
    }

    #[test]
    fn test_channel_count_fixed_on_first_use() {
        let mut filter = IirFilter::new(vec![1.0, -0.5], vec![1.0]).unwrap();
        let stereo = AudioFormat::new(44_100.0, 2);
        let mut buffers = vec![vec![0.0; 4]; 2];
        filter.filter_in_place(&stereo, 4, &mut buffers, 0).unwrap();

        let mut single = vec![vec![0.0; 4]];
        let err = filter.filter_in_place(&mono(), 4, &mut single, 0);
        assert!(matches!(err, Err(SynthError::ChannelMismatch { expected: 2, found: 1 })));
    }

    #[test]
    fn test_biquad_cascade_degree_four() {
        let pzk = digital_pzk(Prototype::Butterworth, 4, FilterKind::Lowpass, A440, None).unwrap();
        let sections = BiquadFilter::cascade(&pzk.poles, &pzk.zeros, pzk.gain).unwrap();
        assert_eq!(sections.len(), 2);

        let denominators = sorted(sections.iter().flat_map(|s| s.denominator()).collect());
        let numerators = sorted(sections.iter().flat_map(|s| s.numerator()).collect());

        let expected_den = sorted(vec![1.0, -1.88686076, 0.890574486, 1.0, -1.949337, 0.953173685]);
        let expected_num = sorted(vec![8.90524834e-7, 1.78104967e-6, 8.90524834e-7, 1.0, 2.0, 1.0]);
        assert_all_close(&denominators, &expected_den, 1e-6);
        assert_all_close(&numerators, &expected_num, 1e-6);
    }

    #[test]
    fn test_biquad_cascade_odd_degree_closes_at_origin() {
        let pzk = digital_pzk(Prototype::Butterworth, 3, FilterKind::Lowpass, A440, None).unwrap();
        let sections = BiquadFilter::cascade(&pzk.poles, &pzk.zeros, pzk.gain).unwrap();
        assert_eq!(sections.len(), 2);
        // The closing section is first order
        let last = &sections[1];
        assert_eq!(last.denominator()[2], 0.0);
        assert_eq!(last.numerator()[2], 0.0);
    }

    #[test]
    fn test_biquad_rejects_unpaired_poles() {
        let real = Complex64::new(0.5, 0.0);
        let complex = Complex64::new(0.5, 0.5);
        assert!(matches!(
            BiquadFilter::from_pzk([real, complex], [real, real], 1.0),
            Err(SynthError::NonConjugatePair("poles"))
        ));
        assert!(matches!(
            BiquadFilter::cascade(&[real, real], &[real], 1.0),
            Err(SynthError::PoleZeroCount { poles: 2, zeros: 1 })
        ));
    }

    #[test]
    fn test_cascade_matches_single_recurrence() {
        let pzk = digital_pzk(Prototype::Butterworth, 2, FilterKind::Lowpass, A440, None).unwrap();
        let mut direct = IirFilter::from_pzk(&pzk.poles, &pzk.zeros, pzk.gain).unwrap();
        let mut sections = BiquadFilter::cascade(&pzk.poles, &pzk.zeros, pzk.gain).unwrap();

        let input: Vec<f64> = (0..256).map(|i| ((i * 7919) % 97) as f64 / 48.0 - 1.0).collect();
        let mut a = vec![input.clone()];
        let mut b = vec![input];
        direct.filter_in_place(&mono(), 256, &mut a, 0).unwrap();
        for section in sections.iter_mut() {
            section.filter_in_place(&mono(), 256, &mut b, 0).unwrap();
        }
        for (x, y) in a[0].iter().zip(&b[0]) {
            assert_approx_eq!(x, y, 1e-9);
        }
    }

    #[test]
    fn test_lowpass_passes_dc() {
        let pzk = digital_pzk(Prototype::Butterworth, 4, FilterKind::Lowpass, A440, None).unwrap();
        let mut sections = BiquadFilter::cascade(&pzk.poles, &pzk.zeros, pzk.gain).unwrap();
        let mut buffers = vec![vec![1.0; 8192]];
        for section in sections.iter_mut() {
            section.filter_in_place(&mono(), 8192, &mut buffers, 0).unwrap();
        }
        assert_approx_eq!(buffers[0][8191], 1.0, 1e-3);
    }

    #[test]
    fn test_offsets_are_honoured() {
        let mut filter = BiquadFilter::default();
        let inputs = vec![vec![0.0, 0.0, 3.0, 4.0]];
        let mut outputs = vec![vec![9.0; 4]];
        filter.filter(&mono(), 2, &inputs, 2, &mut outputs, 1).unwrap();
        assert_eq!(outputs[0], vec![9.0, 3.0, 4.0, 9.0]);
    }
}
