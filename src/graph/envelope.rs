use serde::{Deserialize, Serialize};

use crate::graph::node::AudioFormat;

/*
ADSR Envelope
=============

The envelope is a pure function of the sample index into a note: it keeps
no state, so one envelope serves every note an instrument plays.

  gain
  1.0 ┤    /\
      │   /  \___________
   S  ┤  /               \
      │ /                 \
  0.0 ┼/───────────────────\──→ idx
       |A |D |     S      |R |
                          ^ num_alive

  time = idx / sample_rate

  Attack:   time <= A        → time / A
  Decay:    time <= A + D    → 1 - (time - A) / D · (1 - S)
  Sustain:  idx < num_alive  → S
  Release:                   → max(0, S · (1 - release_time / R))

A zero-length stage is skipped. The release stage needs R·sample_rate
samples past the note's duration; instruments render that much extra so
the tail is not cut off.
*/

/// Per-sample gain applied by an instrument to each note it renders.
pub trait Envelope {
    /// Gain at note-local sample `idx` for a note alive for `num_alive` samples.
    fn gain(&self, format: &AudioFormat, idx: usize, num_alive: usize) -> f64;

    /// Samples of tail needed past the note's duration.
    fn extra_samples(&self, format: &AudioFormat) -> f64;
}

/// Constant gain of 1 and no tail.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnityEnvelope;

impl Envelope for UnityEnvelope {
    fn gain(&self, _format: &AudioFormat, _idx: usize, _num_alive: usize) -> f64 {
        1.0
    }

    fn extra_samples(&self, _format: &AudioFormat) -> f64 {
        0.0
    }
}

/// Stage lengths in seconds, sustain as a level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Adsr {
    pub attack: f64,
    pub decay: f64,
    pub sustain: f64,
    pub release: f64,
}

impl Adsr {
    pub fn new(attack: f64, decay: f64, sustain: f64, release: f64) -> Self {
        Self {
            attack,
            decay,
            sustain,
            release,
        }
    }
}

impl Envelope for Adsr {
    fn gain(&self, format: &AudioFormat, idx: usize, num_alive: usize) -> f64 {
        let time = idx as f64 / format.sample_rate;

        if self.attack > 0.0 && time <= self.attack {
            return time / self.attack;
        }
        if self.decay > 0.0 && time <= self.attack + self.decay {
            return 1.0 - (time - self.attack) / self.decay * (1.0 - self.sustain);
        }
        if idx < num_alive {
            return self.sustain;
        }
        if self.release > 0.0 {
            let release_time = (idx - num_alive) as f64 / format.sample_rate;
            return (self.sustain * (1.0 - release_time / self.release)).max(0.0);
        }
        0.0
    }

    fn extra_samples(&self, format: &AudioFormat) -> f64 {
        self.release * format.sample_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn unit_rate() -> AudioFormat {
        AudioFormat::new(1.0, 1)
    }

    #[test]
    fn test_unit_envelope_stages() {
        let adsr = Adsr::new(1.0, 0.0, 1.0, 1.0);
        let format = unit_rate();

        assert_eq!(adsr.gain(&format, 0, 4), 0.0);
        assert_eq!(adsr.gain(&format, 1, 4), 1.0);
        assert_eq!(adsr.gain(&format, 3, 4), 1.0);
        // Release over one second
        assert_eq!(adsr.gain(&format, 4, 4), 1.0);
        assert_eq!(adsr.gain(&format, 5, 4), 0.0);
        assert_eq!(adsr.gain(&format, 9, 4), 0.0);
        assert_eq!(adsr.extra_samples(&format), 1.0);
    }

    #[test]
    fn test_decay_ramps_to_sustain() {
        let adsr = Adsr::new(0.0, 4.0, 0.5, 0.0);
        let format = unit_rate();
        assert_eq!(adsr.gain(&format, 0, 100), 1.0);
        assert_approx_eq!(adsr.gain(&format, 2, 100), 0.75, 1e-12);
        assert_approx_eq!(adsr.gain(&format, 4, 100), 0.5, 1e-12);
        assert_eq!(adsr.gain(&format, 50, 100), 0.5);
        // No release stage cuts straight to silence
        assert_eq!(adsr.gain(&format, 100, 100), 0.0);
    }

    #[test]
    fn test_release_is_linear_from_sustain() {
        let adsr = Adsr::new(0.0, 0.0, 0.8, 0.01);
        let format = AudioFormat::new(1_000.0, 1);
        assert_approx_eq!(adsr.gain(&format, 20, 20), 0.8, 1e-12);
        assert_approx_eq!(adsr.gain(&format, 25, 20), 0.4, 1e-12);
        assert_eq!(adsr.gain(&format, 40, 20), 0.0);
        assert_approx_eq!(adsr.extra_samples(&format), 10.0, 1e-12);
    }

    #[test]
    fn test_unity() {
        let format = unit_rate();
        assert_eq!(UnityEnvelope.gain(&format, 1234, 0), 1.0);
        assert_eq!(UnityEnvelope.extra_samples(&format), 0.0);
    }

    #[test]
    fn test_adsr_from_json() {
        let adsr: Adsr =
            serde_json::from_str(r#"{"attack": 0.1, "decay": 0.2, "sustain": 0.5, "release": 0.3}"#)
                .unwrap();
        assert_eq!(adsr, Adsr::new(0.1, 0.2, 0.5, 0.3));
    }
}
