use rand::Rng;

use crate::config::SynthRng;
use crate::error::{Result, SynthError};

/// Semitone offsets from the tonic for the common modes.
pub const MAJOR: [f64; 7] = [0.0, 2.0, 4.0, 5.0, 7.0, 9.0, 11.0];
pub const NATURAL_MINOR: [f64; 7] = [0.0, 2.0, 3.0, 5.0, 7.0, 8.0, 10.0];
pub const HARMONIC_MINOR: [f64; 7] = [0.0, 2.0, 3.0, 5.0, 7.0, 8.0, 11.0];
pub const MAJOR_PENTATONIC: [f64; 5] = [0.0, 2.0, 4.0, 7.0, 9.0];

/// Source of pitches for voices.
pub trait PitchScale {
    /// Draw `count` pitches.
    fn sample(&self, count: usize, rng: &mut SynthRng) -> Result<Vec<f64>>;

    fn pitches(&self) -> &[f64];
}

/// Uniform draws without replacement.
///
/// Within one call every pitch is used once before any repeats; asking for
/// more pitches than the scale holds starts a fresh pool.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformScale {
    pitches: Vec<f64>,
}

impl UniformScale {
    pub fn new(pitches: Vec<f64>) -> Result<Self> {
        if pitches.is_empty() {
            return Err(SynthError::EmptyScale);
        }
        Ok(Self { pitches })
    }

    /// `tonic + interval` for every interval.
    pub fn from_intervals(tonic: f64, intervals: &[f64]) -> Result<Self> {
        Self::new(intervals.iter().map(|i| tonic + i).collect())
    }

    /// A4 major, the scale a voice uses when none is given.
    pub fn a4_major() -> Self {
        Self {
            pitches: MAJOR.iter().map(|i| 69.0 + i).collect(),
        }
    }
}

impl PitchScale for UniformScale {
    fn sample(&self, count: usize, rng: &mut SynthRng) -> Result<Vec<f64>> {
        if self.pitches.is_empty() {
            return Err(SynthError::EmptyScale);
        }
        let mut pool: Vec<usize> = Vec::with_capacity(self.pitches.len());
        let mut drawn = Vec::with_capacity(count);
        for _ in 0..count {
            if pool.is_empty() {
                pool.extend(0..self.pitches.len());
            }
            let pick = pool.swap_remove(rng.gen_range(0..pool.len()));
            drawn.push(self.pitches[pick]);
        }
        Ok(drawn)
    }

    fn pitches(&self) -> &[f64] {
        &self.pitches
    }
}
