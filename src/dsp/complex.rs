//! Complex helpers used by the filter-design math.
//!
//! Arithmetic, polar `exp`/`ln`/`powf`/`sqrt` and conjugation come from
//! `num_complex`; this module adds the tolerance comparisons and polynomial
//! helpers the pole/zero code needs.

pub use num_complex::Complex64;

/// Tolerance below which an imaginary part counts as zero.
pub const REAL_TOLERANCE: f64 = 1e-9;

/// Default tolerance for [ComplexExt::near].
pub const NEAR_TOLERANCE: f64 = 1e-6;

pub trait ComplexExt {
    /// Equality by squared distance: `|self - other|² < tolerance²`.
    fn near(&self, other: &Self, tolerance: f64) -> bool;

    fn is_real(&self) -> bool;
}

impl ComplexExt for Complex64 {
    fn near(&self, other: &Self, tolerance: f64) -> bool {
        (self - other).norm_sqr() < tolerance * tolerance
    }

    fn is_real(&self) -> bool {
        self.im.abs() <= REAL_TOLERANCE
    }
}

/// Product of all values, `1` when empty.
pub fn product(values: &[Complex64]) -> Complex64 {
    values
        .iter()
        .fold(Complex64::new(1.0, 0.0), |acc, value| acc * value)
}

/// Monic polynomial coefficients (highest power first) with the given roots.
///
/// Built by convolving `[1]` with `(x - root)` once per root.
pub fn poly_from_roots(roots: &[Complex64]) -> Vec<Complex64> {
    let mut coefficients = vec![Complex64::new(1.0, 0.0)];
    for root in roots {
        let scaled: Vec<Complex64> = coefficients.iter().map(|c| -root * c).collect();
        coefficients.push(Complex64::new(0.0, 0.0));
        for (i, c) in scaled.into_iter().enumerate() {
            coefficients[i + 1] += c;
        }
    }
    coefficients
}

/// Real parts of a coefficient list.
pub fn real_parts(values: &[Complex64]) -> Vec<f64> {
    values.iter().map(|c| c.re).collect()
}

/// True when both lists hold the same values with the same multiplicities,
/// in any order.
pub fn match_unordered(a: &[Complex64], b: &[Complex64], tolerance: f64) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().all(|x| {
        let in_a = a.iter().filter(|y| x.near(y, tolerance)).count();
        let in_b = b.iter().filter(|y| x.near(y, tolerance)).count();
        in_a == in_b
    })
}
