use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::SynthRng;
use crate::error::Result;
use crate::graph::node::{check_channels, AudioBuffer, AudioFormat, Note};
use crate::synth::instrument::Instrument;
use crate::synth::scale::{PitchScale, UniformScale};

/// How a voice fills a measure with notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NoteType {
    /// One note across the whole measure.
    #[default]
    Drone,
    /// Like `Drone`, but the pitch is drawn once and kept.
    Constant,
    /// `speed` short notes, each with its own pitch.
    Pluck,
    /// Three pitches cycled across `speed` slots.
    Arpeggio,
}

/// An instrument playing one note policy, measure after measure.
pub struct Voice {
    instrument: Instrument,
    scale: Box<dyn PitchScale>,
    note_type: NoteType,
    volume: f64,
    speed: f64,
    note_prob: f64,
    last_pitch: Option<f64>,
    rng: SynthRng,
}

impl Voice {
    pub fn new(instrument: Instrument, note_type: NoteType, rng: SynthRng) -> Self {
        Self {
            instrument,
            scale: Box::new(UniformScale::a4_major()),
            note_type,
            volume: 1.0,
            speed: 1.0,
            note_prob: 1.0,
            last_pitch: None,
            rng,
        }
    }

    pub fn with_scale(mut self, scale: Box<dyn PitchScale>) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_volume(mut self, volume: f64) -> Self {
        self.volume = volume;
        self
    }

    /// Notes per measure for `Pluck` and `Arpeggio`.
    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    /// Chance that a note (or the whole arpeggio) is played.
    pub fn with_note_prob(mut self, note_prob: f64) -> Self {
        self.note_prob = note_prob;
        self
    }

    pub fn note_type(&self) -> NoteType {
        self.note_type
    }

    pub fn instrument(&self) -> &Instrument {
        &self.instrument
    }

    pub fn instrument_mut(&mut self) -> &mut Instrument {
        &mut self.instrument
    }

    /// Notes for a measure of `num_frames` samples.
    pub fn generate_notes(&mut self, format: &AudioFormat, num_frames: usize) -> Result<Vec<Note>> {
        let frames = num_frames as f64;
        let tail = self.instrument.envelope().extra_samples(format);
        let slots = self.speed.max(0.0).floor() as usize;
        let mut notes = Vec::new();

        match self.note_type {
            NoteType::Drone => {
                if self.gate() {
                    let pitch = self.draw_pitch()?;
                    notes.push(Note::new(pitch, self.volume, 0.0, (frames - tail).max(0.0)));
                }
            }
            NoteType::Constant => {
                if self.gate() {
                    let pitch = match self.last_pitch {
                        Some(pitch) => pitch,
                        None => self.draw_pitch()?,
                    };
                    self.last_pitch = Some(pitch);
                    notes.push(Note::new(pitch, self.volume, 0.0, (frames - tail).max(0.0)));
                }
            }
            NoteType::Pluck => {
                let duration = (frames / self.speed - tail).max(0.0);
                for idx in 0..slots {
                    if !self.gate() {
                        continue;
                    }
                    let pitch = self.draw_pitch()?;
                    let start = (idx as f64 / self.speed * frames).floor();
                    notes.push(Note::new(pitch, self.volume / self.speed, start, duration));
                }
            }
            NoteType::Arpeggio => {
                if self.gate() {
                    let choices = self.scale.sample(3, &mut self.rng)?;
                    let duration = (frames / self.speed - tail).max(0.0);
                    for idx in 0..slots {
                        let start = (idx as f64 / self.speed * frames).floor();
                        let pitch = choices[idx % choices.len()];
                        notes.push(Note::new(pitch, self.volume / self.speed, start, duration));
                    }
                }
            }
        }

        log::trace!("{:?} measure of {num_frames} frames: {notes:?}", self.note_type);
        Ok(notes)
    }

    /// Mix one measure into `buffers`; its length is the buffers' length.
    pub fn write_measure(&mut self, format: &AudioFormat, buffers: &mut [AudioBuffer]) -> Result<()> {
        check_channels(format, buffers)?;
        let num_frames = buffers.first().map_or(0, Vec::len);
        for note in self.generate_notes(format, num_frames)? {
            self.instrument.write_note(format, &note, buffers)?;
        }
        Ok(())
    }

    fn gate(&mut self) -> bool {
        self.rng.gen::<f64>() < self.note_prob
    }

    fn draw_pitch(&mut self) -> Result<f64> {
        let drawn = self.scale.sample(1, &mut self.rng)?;
        Ok(drawn[0])
    }
}
