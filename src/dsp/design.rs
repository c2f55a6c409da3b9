use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::dsp::complex::{product, Complex64};
use crate::error::{Result, SynthError};

/*
IIR Filter Design
=================

Digital IIR filters are designed in three steps:

  1. Start from an analog lowpass PROTOTYPE with cutoff 1 rad/s, described by
     its poles, zeros and gain (PZK).
  2. FREQUENCY-TRANSFORM the prototype into the requested response (lowpass,
     highpass, bandpass, bandstop) at the requested cutoff(s).
  3. Map the analog filter to the z-plane with the BILINEAR transform.

Prewarping
----------

The bilinear transform squashes the whole analog frequency axis into
[0, pi], so cutoffs are pre-distorted before step 2:

    warped = 4 * tan(omega / 2)

and the mapping in step 3 is

    z = (4 + s) / (4 - s)

The 4 is a fixed analog sampling interval. It cancels out of the final
coefficients as long as both places agree, which is why it is a literal in
both rather than a parameter.

Band transforms
---------------

Bandpass and bandstop split every pole (and zero) p into the two roots of

    s^2 - 2 p' s + w0^2 = 0      (p' = p * bw / 2, or bw / 2 / p for bandstop)

centred on the geometric mean w0 = sqrt(low * high) of the band edges, so the
filter degree doubles.
*/

/// Poles, zeros and gain of a rational transfer function.
#[derive(Debug, Clone, PartialEq)]
pub struct Pzk {
    pub poles: Vec<Complex64>,
    pub zeros: Vec<Complex64>,
    pub gain: f64,
}

/// Analog lowpass prototypes with unit cutoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Prototype {
    Butterworth,
}

impl Prototype {
    pub fn analog(self, degree: usize) -> Pzk {
        match self {
            Prototype::Butterworth => butterworth(degree),
        }
    }
}

/// Frequency response shape produced by [digital_pzk].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FilterKind {
    Lowpass,
    Highpass,
    Bandpass,
    Bandstop,
}

/// Butterworth poles at `exp(i*pi*(2k + N - 1) / 2N)` for `k = 1..=N`.
///
/// All poles sit on the unit circle in the left half-plane; there are no
/// finite zeros.
pub fn butterworth(degree: usize) -> Pzk {
    let n = degree as f64;
    let poles = (1..=degree)
        .map(|k| Complex64::new(0.0, PI * (2.0 * k as f64 + n - 1.0) / (2.0 * n)).exp())
        .collect();
    Pzk {
        poles,
        zeros: Vec::new(),
        gain: 1.0,
    }
}

/// Bilinear prewarp of an angular frequency in `[0, pi]`.
pub fn prewarp(omega: f64) -> f64 {
    4.0 * (omega / 2.0).tan()
}

/// Design a digital filter.
///
/// `cutoff` and `secondary` are angular frequencies in `[0, pi]` (pi is
/// Nyquist). Band filters need `secondary` as the upper band edge.
pub fn digital_pzk(
    prototype: Prototype,
    degree: usize,
    kind: FilterKind,
    cutoff: f64,
    secondary: Option<f64>,
) -> Result<Pzk> {
    let analog = prototype.analog(degree);
    let warped = prewarp(cutoff);
    let transformed = match kind {
        FilterKind::Lowpass => lowpass(analog, warped),
        FilterKind::Highpass => highpass(analog, warped),
        FilterKind::Bandpass | FilterKind::Bandstop => {
            let upper = secondary.map(prewarp).ok_or_else(|| SynthError::MissingField {
                component: "design_iir".to_string(),
                field: "secondaryCutoff",
            })?;
            if kind == FilterKind::Bandpass {
                bandpass(analog, warped, upper)
            } else {
                bandstop(analog, warped, upper)
            }
        }
    };
    let digital = bilinear(transformed);
    log::debug!(
        "designed {kind:?} {prototype:?} degree {degree}: {} poles, gain {:e}",
        digital.poles.len(),
        digital.gain
    );
    Ok(digital)
}

fn lowpass(pzk: Pzk, cutoff: f64) -> Pzk {
    let relative = pzk.poles.len() as i32 - pzk.zeros.len() as i32;
    Pzk {
        poles: pzk.poles.iter().map(|p| p * cutoff).collect(),
        zeros: pzk.zeros.iter().map(|z| z * cutoff).collect(),
        gain: pzk.gain * cutoff.powi(relative),
    }
}

fn highpass(pzk: Pzk, cutoff: f64) -> Pzk {
    let gain = pzk.gain * negated_ratio(&pzk.zeros, &pzk.poles);
    let relative = pzk.poles.len().saturating_sub(pzk.zeros.len());
    let mut zeros: Vec<Complex64> = pzk.zeros.iter().map(|z| cutoff / z).collect();
    zeros.extend(std::iter::repeat(Complex64::new(0.0, 0.0)).take(relative));
    Pzk {
        poles: pzk.poles.iter().map(|p| cutoff / p).collect(),
        zeros,
        gain,
    }
}

fn bandpass(pzk: Pzk, low: f64, high: f64) -> Pzk {
    let width = high - low;
    let center = (low * high).sqrt();
    let relative = pzk.poles.len().saturating_sub(pzk.zeros.len());

    let scale = |c: &Complex64| c * (width / 2.0);
    let mut zeros = split_around(pzk.zeros.iter().map(scale), center);
    zeros.extend(std::iter::repeat(Complex64::new(0.0, 0.0)).take(relative));
    Pzk {
        poles: split_around(pzk.poles.iter().map(scale), center),
        zeros,
        gain: pzk.gain * width.powi(relative as i32),
    }
}

fn bandstop(pzk: Pzk, low: f64, high: f64) -> Pzk {
    let width = high - low;
    let center = (low * high).sqrt();
    let relative = pzk.poles.len().saturating_sub(pzk.zeros.len());
    let gain = pzk.gain * negated_ratio(&pzk.zeros, &pzk.poles);

    let invert = |c: &Complex64| (width / 2.0) / c;
    let mut zeros = split_around(pzk.zeros.iter().map(invert), center);
    zeros.extend(std::iter::repeat(Complex64::new(0.0, center)).take(relative));
    zeros.extend(std::iter::repeat(Complex64::new(0.0, -center)).take(relative));
    Pzk {
        poles: split_around(pzk.poles.iter().map(invert), center),
        zeros,
        gain,
    }
}

/// Each root `r` becomes `r ± sqrt(r² - w0²)`.
fn split_around(roots: impl Iterator<Item = Complex64>, center: f64) -> Vec<Complex64> {
    let w0_sq = center * center;
    roots
        .flat_map(|r| {
            let offset = (r * r - w0_sq).sqrt();
            [r + offset, r - offset]
        })
        .collect()
}

/// `Re(prod(-zeros) / prod(-poles))`.
fn negated_ratio(zeros: &[Complex64], poles: &[Complex64]) -> f64 {
    let neg = |values: &[Complex64]| product(&values.iter().map(|v| -v).collect::<Vec<_>>());
    (neg(zeros) / neg(poles)).re
}

/// Map an analog PZK to the z-plane with `z = (4 + s) / (4 - s)`, padding
/// zeros at `z = -1` up to the pole count.
pub fn bilinear(pzk: Pzk) -> Pzk {
    let four = Complex64::new(4.0, 0.0);
    let map = |s: &Complex64| (four + s) / (four - s);

    let gain_ratio = product(&pzk.zeros.iter().map(|z| four - z).collect::<Vec<_>>())
        / product(&pzk.poles.iter().map(|p| four - p).collect::<Vec<_>>());

    let padding = pzk.poles.len().saturating_sub(pzk.zeros.len());
    let mut zeros: Vec<Complex64> = pzk.zeros.iter().map(map).collect();
    zeros.extend(std::iter::repeat(Complex64::new(-1.0, 0.0)).take(padding));

    Pzk {
        poles: pzk.poles.iter().map(map).collect(),
        zeros,
        gain: pzk.gain * gain_ratio.re,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::complex::{match_unordered, ComplexExt};
    use assert_approx_eq::assert_approx_eq;

    const A440: f64 = 2.0 * PI * 440.0 / 44_100.0;

    fn conjugates(re: f64, im: f64) -> [Complex64; 2] {
        [Complex64::new(re, im), Complex64::new(re, -im)]
    }

    #[test]
    fn butterworth_poles_on_left_unit_circle() {
        let pzk = butterworth(5);
        assert_eq!(pzk.poles.len(), 5);
        assert!(pzk.zeros.is_empty());
        for pole in &pzk.poles {
            assert_approx_eq!(pole.norm(), 1.0, 1e-12);
            assert!(pole.re <= 1e-12);
        }
    }

    #[test]
    fn lowpass_degree_two() {
        let pzk = digital_pzk(Prototype::Butterworth, 2, FilterKind::Lowpass, A440, None).unwrap();

        assert!(match_unordered(&pzk.poles, &conjugates(0.9556991, 0.04241989), 1e-6));
        assert!(match_unordered(&pzk.zeros, &[Complex64::new(-1.0, 0.0); 2], 1e-6));
        assert_approx_eq!(pzk.gain, 9.4050433119e-4, 1e-9);
    }

    #[test]
    fn lowpass_degree_five() {
        let pzk = digital_pzk(Prototype::Butterworth, 5, FilterKind::Lowpass, A440, None).unwrap();

        let [a, b] = conjugates(0.97908124, 0.05845053);
        let [c, d] = conjugates(0.94989177, 0.03504743);
        let expected = [a, b, c, d, Complex64::new(0.93919657, 0.0)];
        assert!(match_unordered(&pzk.poles, &expected, 1e-6));
        assert!(pzk.zeros.iter().all(|z| z.near(&Complex64::new(-1.0, 0.0), 1e-9)));
        assert_approx_eq!(pzk.gain, 2.73823151168e-8, 1e-9);
    }

    #[test]
    fn highpass_degree_two() {
        let pzk = digital_pzk(Prototype::Butterworth, 2, FilterKind::Highpass, A440, None).unwrap();

        assert!(match_unordered(&pzk.poles, &conjugates(0.9556991, 0.04241989), 1e-6));
        assert!(match_unordered(&pzk.zeros, &[Complex64::new(1.0, 0.0); 2], 1e-6));
        assert_approx_eq!(pzk.gain, 0.956639602, 1e-9);
    }

    #[test]
    fn bandpass_doubles_degree() {
        let upper = 2.0 * PI * 1440.0 / 44_100.0;
        let pzk =
            digital_pzk(Prototype::Butterworth, 2, FilterKind::Bandpass, A440, Some(upper)).unwrap();

        let [a, b] = conjugates(0.96988298, 0.06326052);
        let [c, d] = conjugates(0.91744194, 0.15391718);
        assert!(match_unordered(&pzk.poles, &[a, b, c, d], 1e-6));

        let one = Complex64::new(1.0, 0.0);
        assert!(match_unordered(&pzk.zeros, &[one, one, -one, -one], 1e-6));
        assert_approx_eq!(pzk.gain, 4.603998475022e-3, 1e-9);
    }

    #[test]
    fn bandstop_zeros_sit_on_the_center() {
        let upper = 2.0 * PI * 1440.0 / 44_100.0;
        let pzk =
            digital_pzk(Prototype::Butterworth, 2, FilterKind::Bandstop, A440, Some(upper)).unwrap();

        assert_eq!(pzk.poles.len(), 4);
        assert_eq!(pzk.zeros.len(), 4);
        // Bandstop zeros lie on the unit circle
        for zero in &pzk.zeros {
            assert_approx_eq!(zero.norm(), 1.0, 1e-9);
        }
        assert_approx_eq!(pzk.gain, 0.9041522032, 1e-9);
    }

    #[test]
    fn band_filters_need_upper_edge() {
        let err = digital_pzk(Prototype::Butterworth, 2, FilterKind::Bandpass, A440, None);
        assert!(matches!(err, Err(SynthError::MissingField { .. })));
    }

    #[test]
    fn kinds_parse_from_uppercase_names() {
        let kind: FilterKind = serde_json::from_str("\"HIGHPASS\"").unwrap();
        assert_eq!(kind, FilterKind::Highpass);
        let proto: Prototype = serde_json::from_str("\"BUTTERWORTH\"").unwrap();
        assert_eq!(proto, Prototype::Butterworth);
    }
}
