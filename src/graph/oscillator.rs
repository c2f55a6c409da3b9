use std::f64::consts::{PI, TAU};

use crate::error::Result;
use crate::graph::node::{check_span, AudioBuffer, AudioFormat, Generator, Note};

/*
Phase-Driven Oscillators
========================

Oscillators here are split in two: a PHASE source and a WAVEFORM shaper.

  Linear:     writes the running phase 2π·f·t/sr for the note
  Oscillator: reads a child's output as phase and maps it to a waveform

    [Linear] ──phase──→ [Oscillator::sine] ──→ output

Because the shaper only sees "a phase", anything can drive it: a note
modifier in between transposes it, an Addition of two phases gives phase
modulation, a detuned copy gives beating.

Waveforms (x = incoming phase, v = note volume):
------------------------------------------------

  Sine:    v · sin(x)
  Saw:     v · ((x/π mod 2) - 1)
  Square:  v · sign(duty) · (+1 if x mod 2π <= 2π·|duty| else -1)

A negative duty flips the square upside down; a duty of 0 is silence.

Liveness:
---------
Linear counts elapsed samples from the first call and writes 0 outside the
note's [start, duration) window. It reports "alive" while the elapsed count
is below the note duration. Shapers pass their child's answer through.
*/

/// Running phase for the note's frequency.
///
/// Volume is ignored; shapers apply it.
#[derive(Debug, Default, Clone)]
pub struct Linear {
    elapsed: f64,
}

impl Linear {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Generator for Linear {
    fn generate(
        &mut self,
        format: &AudioFormat,
        note: &Note,
        num_samples: usize,
        outputs: &mut [AudioBuffer],
        offset: usize,
    ) -> Result<bool> {
        check_span(outputs, offset, num_samples)?;
        let step = TAU * note.frequency() / format.sample_rate;
        for i in 0..num_samples {
            let t = self.elapsed + i as f64;
            let phase = if note.sounding_at(t) { t * step } else { 0.0 };
            for output in outputs.iter_mut() {
                output[offset + i] = phase;
            }
        }
        self.elapsed += num_samples as f64;
        Ok(self.elapsed < note.duration)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Waveform {
    Sine,
    Saw,
    /// Fraction of the period spent high. Sign flips the wave.
    Square { duty: f64 },
}

impl Waveform {
    #[inline]
    pub fn shape(self, phase: f64, volume: f64) -> f64 {
        match self {
            Waveform::Sine => volume * phase.sin(),
            Waveform::Saw => volume * ((phase / PI) % 2.0 - 1.0),
            Waveform::Square { duty } => {
                if duty == 0.0 {
                    return 0.0;
                }
                let high = phase % TAU <= TAU * duty.abs();
                volume * duty.signum() * if high { 1.0 } else { -1.0 }
            }
        }
    }
}

/// Maps a child generator's phase through a waveform.
pub struct Oscillator<G> {
    phase: G,
    waveform: Waveform,
}

impl<G> Oscillator<G> {
    pub fn new(phase: G, waveform: Waveform) -> Self {
        Self { phase, waveform }
    }

    pub fn sine(phase: G) -> Self {
        Self::new(phase, Waveform::Sine)
    }

    pub fn saw(phase: G) -> Self {
        Self::new(phase, Waveform::Saw)
    }

    pub fn square(phase: G, duty: f64) -> Self {
        Self::new(phase, Waveform::Square { duty })
    }

    pub fn waveform(&self) -> Waveform {
        self.waveform
    }
}

impl<G: Generator> Generator for Oscillator<G> {
    fn generate(
        &mut self,
        format: &AudioFormat,
        note: &Note,
        num_samples: usize,
        outputs: &mut [AudioBuffer],
        offset: usize,
    ) -> Result<bool> {
        check_span(outputs, offset, num_samples)?;
        let alive = self.phase.generate(format, note, num_samples, outputs, offset)?;
        for output in outputs.iter_mut() {
            for sample in &mut output[offset..offset + num_samples] {
                *sample = self.waveform.shape(*sample, note.volume);
            }
        }
        Ok(alive)
    }
}

/// Constant offset. Ignores the note and never dies.
#[derive(Debug, Clone, Copy)]
pub struct Dc {
    value: f64,
}

impl Dc {
    pub fn new(value: f64) -> Self {
        Self { value }
    }
}

impl Generator for Dc {
    fn generate(
        &mut self,
        _format: &AudioFormat,
        _note: &Note,
        num_samples: usize,
        outputs: &mut [AudioBuffer],
        offset: usize,
    ) -> Result<bool> {
        check_span(outputs, offset, num_samples)?;
        for output in outputs.iter_mut() {
            output[offset..offset + num_samples].fill(self.value);
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::node::silent_buffers;
    use assert_approx_eq::assert_approx_eq;

    fn format() -> AudioFormat {
        AudioFormat::new(44_100.0, 1)
    }

    fn a4(duration: f64) -> Note {
        Note::new(69.0, 1.0, 0.0, duration)
    }

    #[test]
    fn test_linear_phase_advances_across_calls() {
        let mut linear = Linear::new();
        let step = TAU * 440.0 / 44_100.0;
        let mut buffers = silent_buffers(1, 4);

        assert!(linear.generate(&format(), &a4(100.0), 4, &mut buffers, 0).unwrap());
        assert_approx_eq!(buffers[0][3], 3.0 * step, 1e-12);

        linear.generate(&format(), &a4(100.0), 4, &mut buffers, 0).unwrap();
        assert_approx_eq!(buffers[0][0], 4.0 * step, 1e-12);
    }

    #[test]
    fn test_linear_silent_outside_window() {
        let mut linear = Linear::new();
        let note = Note::new(69.0, 1.0, 2.0, 4.0);
        let mut buffers = silent_buffers(1, 6);
        let alive = linear.generate(&format(), &note, 6, &mut buffers, 0).unwrap();

        assert!(!alive, "elapsed 6 is past duration 4");
        assert_eq!(buffers[0][0], 0.0);
        assert_eq!(buffers[0][1], 0.0);
        assert!(buffers[0][2] > 0.0);
        assert_eq!(buffers[0][4], 0.0);
    }

    #[test]
    fn test_linear_honours_offset() {
        let mut linear = Linear::new();
        let mut buffers = vec![vec![7.0; 4]];
        linear.generate(&format(), &a4(100.0), 2, &mut buffers, 2).unwrap();
        assert_eq!(buffers[0][0], 7.0);
        assert_eq!(buffers[0][2], 0.0);
        assert!(buffers[0][3] > 0.0);
    }

    #[test]
    fn test_sine_matches_closed_form() {
        let mut osc = Oscillator::sine(Linear::new());
        let note = Note::new(69.0, 0.5, 0.0, f64::INFINITY);
        let mut buffers = silent_buffers(1, 64);
        osc.generate(&format(), &note, 64, &mut buffers, 0).unwrap();

        for (i, sample) in buffers[0].iter().enumerate() {
            let expected = 0.5 * (TAU * 440.0 * i as f64 / 44_100.0).sin();
            assert_approx_eq!(sample, expected, 1e-12);
        }
    }

    #[test]
    fn test_saw_range() {
        for phase in [0.0, 1.0, PI, 5.0, 100.0] {
            let value = Waveform::Saw.shape(phase, 1.0);
            assert!((-1.0..1.0).contains(&value), "saw({phase}) = {value}");
        }
        assert_eq!(Waveform::Saw.shape(0.0, 1.0), -1.0);
        assert_approx_eq!(Waveform::Saw.shape(PI, 1.0), 0.0, 1e-12);
    }

    #[test]
    fn test_square_duty() {
        let square = Waveform::Square { duty: 0.25 };
        assert_eq!(square.shape(0.1, 1.0), 1.0);
        assert_eq!(square.shape(PI, 1.0), -1.0);

        let inverted = Waveform::Square { duty: -0.25 };
        assert_eq!(inverted.shape(0.1, 1.0), -1.0);

        assert_eq!(Waveform::Square { duty: 0.0 }.shape(0.1, 1.0), 0.0);
    }

    #[test]
    fn test_dc_fills_and_stays_alive() {
        let mut dc = Dc::new(0.25);
        let mut buffers = silent_buffers(2, 3);
        assert!(dc.generate(&format(), &a4(0.0), 3, &mut buffers, 0).unwrap());
        assert!(buffers.iter().flatten().all(|s| *s == 0.25));
    }
}
