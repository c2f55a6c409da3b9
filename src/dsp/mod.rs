//! Numeric kernel and filter engines.
//!
//! Everything here works on plain `f64` sample buffers and complex pole/zero
//! lists. The graph layer wraps these engines as nodes; the design helpers
//! turn cutoff frequencies into coefficients for them.

use crate::error::{Result, SynthError};

/// Complex tolerance comparisons and polynomial helpers.
pub mod complex;
/// Analog prototypes, frequency transforms and the bilinear mapping.
pub mod design;
/// Radix-2 FFT and inverse.
pub mod fft;
/// Direct convolution filters and windowed-sinc design.
pub mod fir;
/// Direct-form IIR and biquad cascades.
pub mod iir;
/// Window functions for FIR design.
pub mod window;

/// Size per-channel history rings on first use and fix the channel count.
pub(crate) fn sized_histories(histories: &mut Vec<Vec<f64>>, channels: usize, len: usize) -> Result<()> {
    if histories.is_empty() {
        *histories = vec![vec![0.0; len]; channels];
        return Ok(());
    }
    if histories.len() != channels {
        return Err(SynthError::ChannelMismatch {
            expected: histories.len(),
            found: channels,
        });
    }
    Ok(())
}
