use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// Tapers applied to windowed-sinc FIR designs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Window {
    #[default]
    Boxcar,
    Hann,
    Hamming,
}

impl Window {
    /// Weight of tap `x` in an `n`-tap window.
    pub fn weight(self, x: usize, n: usize) -> f64 {
        match self {
            Window::Boxcar => 1.0,
            Window::Hann => general_hann(x, n, 0.5),
            Window::Hamming => general_hann(x, n, 25.0 / 46.0),
        }
    }

    pub fn weights(self, n: usize) -> Vec<f64> {
        (0..n).map(|x| self.weight(x, n)).collect()
    }
}

/// `alpha + (alpha - 1)·cos(2πx / (n - 1))`.
fn general_hann(x: usize, n: usize, alpha: f64) -> f64 {
    if n <= 1 {
        return 1.0;
    }
    alpha + (alpha - 1.0) * (2.0 * PI * x as f64 / (n - 1) as f64).cos()
}
