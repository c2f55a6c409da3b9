use crate::error::Result;
use crate::graph::node::{AudioBuffer, AudioFormat, Generator, Note};

/// How a [NoteModifier] changes pitch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PitchChange {
    /// Replace the pitch outright.
    Absolute(f64),
    /// Shift by `semitones`, then by `hz` converted to semitones against
    /// the incoming note's frequency.
    Relative { semitones: f64, hz: f64 },
}

/// How a [NoteModifier] changes volume.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VolumeChange {
    Absolute(f64),
    Scale(f64),
}

/// Rewrites the note its child sees.
pub struct NoteModifier<G> {
    generator: G,
    pitch: Option<PitchChange>,
    volume: Option<VolumeChange>,
}

impl<G> NoteModifier<G> {
    pub fn new(generator: G) -> Self {
        Self {
            generator,
            pitch: None,
            volume: None,
        }
    }

    pub fn with_pitch(mut self, change: PitchChange) -> Self {
        self.pitch = Some(change);
        self
    }

    pub fn with_volume(mut self, change: VolumeChange) -> Self {
        self.volume = Some(change);
        self
    }

    /// Shift up by `hz` (down when negative).
    pub fn detuned(generator: G, hz: f64) -> Self {
        Self::new(generator).with_pitch(PitchChange::Relative { semitones: 0.0, hz })
    }

    pub fn modify(&self, note: &Note) -> Note {
        let pitch = match self.pitch {
            None => note.pitch,
            Some(PitchChange::Absolute(pitch)) => pitch,
            Some(PitchChange::Relative { semitones, hz }) => {
                let ratio = 1.0 + hz / note.frequency();
                // A shift at or past 0 Hz has no pitch
                let shift = if ratio > 0.0 { 12.0 * ratio.log2() } else { 0.0 };
                note.pitch + semitones + shift
            }
        };
        let volume = match self.volume {
            None => note.volume,
            Some(VolumeChange::Absolute(volume)) => volume,
            Some(VolumeChange::Scale(factor)) => note.volume * factor,
        };
        note.with_pitch(pitch).with_volume(volume)
    }
}

impl<G: Generator> Generator for NoteModifier<G> {
    fn generate(
        &mut self,
        format: &AudioFormat,
        note: &Note,
        num_samples: usize,
        outputs: &mut [AudioBuffer],
        offset: usize,
    ) -> Result<bool> {
        let modified = self.modify(note);
        self.generator
            .generate(format, &modified, num_samples, outputs, offset)
    }
}
