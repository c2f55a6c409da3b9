//! Peak normalisation for rendered buffers.
//!
//! Rendering never clamps, so callers that hand buffers to a fixed-range
//! sink normalise first.

use crate::graph::node::AudioBuffer;

fn peak(buffer: &[f64]) -> f64 {
    buffer.iter().fold(0.0, |acc: f64, s| acc.max(s.abs()))
}

fn rescale(peak: f64, to: f64, amplify: bool) -> Option<f64> {
    // Silence has no peak to scale
    if peak == 0.0 || !peak.is_finite() || (peak <= to && !amplify) {
        return None;
    }
    Some(to / peak)
}

/// Scale `buffer` so its peak magnitude is `to`.
///
/// Without `amplify` only loud buffers are turned down.
pub fn normalize(buffer: &mut [f64], to: f64, amplify: bool) {
    if let Some(scale) = rescale(peak(buffer), to, amplify) {
        buffer.iter_mut().for_each(|s| *s *= scale);
    }
}

/// Normalise a buffer set, either per channel or by the loudest channel.
pub fn normalize_all(buffers: &mut [AudioBuffer], to: f64, amplify: bool, independent: bool) {
    if independent {
        for buffer in buffers.iter_mut() {
            normalize(buffer, to, amplify);
        }
        return;
    }
    let loudest = buffers.iter().map(|b| peak(b)).fold(0.0, f64::max);
    if let Some(scale) = rescale(loudest, to, amplify) {
        for buffer in buffers.iter_mut() {
            buffer.iter_mut().for_each(|s| *s *= scale);
        }
    }
}
