use rand::{RngCore, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

use crate::graph::node::AudioFormat;

/// Random source owned by every stochastic node and voice.
pub type SynthRng = Xoshiro256PlusPlus;

/// Rendering configuration shared by the builder and the caller.
///
/// `seed` makes every random decision in a built graph reproducible: each
/// node that needs randomness draws its own generator from a master stream
/// seeded here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthConfig {
    pub sample_rate: f64,
    pub channels: usize,
    pub seed: Option<u64>,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44_100.0,
            channels: 2,
            seed: None,
        }
    }
}

impl SynthConfig {
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }

    pub fn format(&self) -> AudioFormat {
        AudioFormat::new(self.sample_rate, self.channels)
    }

    pub fn rng_source(&self) -> RngSource {
        RngSource::new(self.seed)
    }
}

/// Hands out independent generators derived from one master stream.
pub struct RngSource {
    master: SynthRng,
}

impl RngSource {
    pub fn new(seed: Option<u64>) -> Self {
        let master = match seed {
            Some(seed) => SynthRng::seed_from_u64(seed),
            None => SynthRng::from_entropy(),
        };
        Self { master }
    }

    pub fn next_rng(&mut self) -> SynthRng {
        SynthRng::seed_from_u64(self.master.next_u64())
    }
}
