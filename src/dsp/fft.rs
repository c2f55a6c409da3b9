//! Iterative radix-2 discrete Fourier transform.
//!
//! Lengths must be powers of two; [fft] and [rfft] zero-pad their input up to
//! the next one.

use std::f64::consts::PI;

use crate::dsp::complex::Complex64;
use crate::error::{Result, SynthError};

/// In-place forward DFT. `buffer.len()` must be a power of two.
pub fn fft_in_place(buffer: &mut [Complex64]) -> Result<()> {
    let n = buffer.len();
    if !n.is_power_of_two() {
        return Err(SynthError::NotPowerOfTwo(n));
    }
    radix2(buffer);
    Ok(())
}

fn radix2(buffer: &mut [Complex64]) {
    let n = buffer.len();
    if n <= 1 {
        return;
    }

    let bits = n.trailing_zeros();
    for i in 0..n {
        let j = i.reverse_bits() >> (usize::BITS - bits);
        if j > i {
            buffer.swap(i, j);
        }
    }

    let twiddles: Vec<Complex64> = (0..n / 2)
        .map(|k| Complex64::new(0.0, -2.0 * PI * k as f64 / n as f64).exp())
        .collect();

    let mut m = 2;
    while m <= n {
        let half = m / 2;
        let stride = n / m;
        for k in (0..n).step_by(m) {
            for j in 0..half {
                let t = twiddles[j * stride] * buffer[k + j + half];
                buffer[k + j + half] = buffer[k + j] - t;
                buffer[k + j] += t;
            }
        }
        m *= 2;
    }
}

/// In-place inverse DFT: conjugate, forward transform, conjugate, scale by `1/n`.
pub fn ifft_in_place(buffer: &mut [Complex64]) -> Result<()> {
    for c in buffer.iter_mut() {
        *c = c.conj();
    }
    fft_in_place(buffer)?;
    let scale = 1.0 / buffer.len() as f64;
    for c in buffer.iter_mut() {
        *c = c.conj() * scale;
    }
    Ok(())
}

/// Forward DFT of `input` zero-padded to the next power of two.
pub fn fft(input: &[Complex64]) -> Vec<Complex64> {
    let mut buffer = padded(input.iter().copied(), input.len());
    radix2(&mut buffer);
    buffer
}

/// Inverse of [fft]. The input length must already be a power of two.
pub fn ifft(input: &[Complex64]) -> Result<Vec<Complex64>> {
    let mut buffer = input.to_vec();
    ifft_in_place(&mut buffer)?;
    Ok(buffer)
}

/// DFT of a real sequence, returning only the `n/2 + 1` unique bins of the
/// zero-padded transform.
pub fn rfft(input: &[f64]) -> Vec<Complex64> {
    let mut buffer = padded(
        input.iter().map(|&x| Complex64::new(x, 0.0)),
        input.len(),
    );
    radix2(&mut buffer);
    let bins = buffer.len() / 2 + 1;
    buffer.truncate(bins);
    buffer
}

/// `values` padded with zeros to a power-of-two length, at least one.
fn padded(values: impl Iterator<Item = Complex64>, len: usize) -> Vec<Complex64> {
    let size = len.max(1).next_power_of_two();
    let mut buffer: Vec<Complex64> = values.collect();
    buffer.resize(size, Complex64::new(0.0, 0.0));
    buffer
}
