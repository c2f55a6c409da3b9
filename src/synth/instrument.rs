use std::rc::Rc;

use crate::error::{Result, SynthError};
use crate::graph::envelope::{Envelope, UnityEnvelope};
use crate::graph::node::{
    check_channels, check_span, silent_buffers, zeroed_scratch, AudioBuffer, AudioFormat, Generator, Note,
};
use crate::graph::reference::Registry;

/*
Instrument
==========

An instrument turns timed notes into audio. The generator graph never sees
the note's timing: it renders a "living" note (start -inf, duration +inf)
and the instrument shapes the result with its envelope.

  output[start + i] += envelope.gain(i, alive) * rendered[i]

  start
    │◄────── alive ──────►│◄─ release tail ─►│
    ▼                     ▼                  ▼
    ╱‾‾‾‾‾╲_______________                   │
                          ‾‾‾‾‾‾‾‾‾‾──────___│

Notes are mixed additively, so overlapping notes sum. The tail past the
buffer end is cut off.
*/

pub struct Instrument {
    generator: Box<dyn Generator>,
    envelope: Rc<dyn Envelope>,
    registry: Registry,
    scratch: Vec<AudioBuffer>,
}

impl Instrument {
    pub fn new(generator: Box<dyn Generator>) -> Self {
        Self {
            generator,
            envelope: Rc::new(UnityEnvelope),
            registry: Registry::new(),
            scratch: Vec::new(),
        }
    }

    pub fn with_envelope(mut self, envelope: Rc<dyn Envelope>) -> Self {
        self.envelope = envelope;
        self
    }

    /// Keep the names the patch declared, so they can be inspected later.
    pub fn with_registry(mut self, registry: Registry) -> Self {
        self.registry = registry;
        self
    }

    pub fn envelope(&self) -> &dyn Envelope {
        self.envelope.as_ref()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Samples a note of `duration` keeps sounding for, release included.
    pub fn note_span(&self, format: &AudioFormat, duration: f64) -> usize {
        (duration + self.envelope.extra_samples(format)).floor() as usize
    }

    /// Mix one note into `outputs`, starting at sample `note.start`.
    pub fn write_note(&mut self, format: &AudioFormat, note: &Note, outputs: &mut [AudioBuffer]) -> Result<()> {
        check_channels(format, outputs)?;
        validate(note)?;
        if format.channels == 0 {
            return Ok(());
        }

        let len = outputs[0].len();
        let start = note.start.floor() as usize;
        if start >= len {
            return Ok(());
        }
        let num_alive = note.duration.floor() as usize;
        let end = start.saturating_add(self.note_span(format, note.duration)).min(len);
        let num_samples = end - start;
        check_span(outputs, start, num_samples)?;

        let scratch = zeroed_scratch(&mut self.scratch, format.channels, num_samples);
        self.generator
            .generate(format, &note.living(), num_samples, scratch, 0)?;

        for idx in 0..num_samples {
            let gain = self.envelope.gain(format, idx, num_alive);
            for (output, rendered) in outputs.iter_mut().zip(scratch.iter()) {
                output[start + idx] += gain * rendered[idx];
            }
        }
        Ok(())
    }

    /// Render `notes` into fresh buffers sized to the last note's end plus
    /// the envelope tail.
    pub fn render_sequence(&mut self, format: &AudioFormat, notes: &[Note]) -> Result<Vec<AudioBuffer>> {
        if notes.is_empty() {
            return Ok(silent_buffers(format.channels, 0));
        }
        for note in notes {
            validate(note)?;
            if !note.duration.is_finite() {
                return Err(SynthError::InvalidNote(format!(
                    "a sequence needs finite durations, got {}",
                    note.duration
                )));
            }
        }

        let mut sorted = notes.to_vec();
        sorted.sort_by(|a, b| a.start.total_cmp(&b.start));

        let last_end = sorted
            .iter()
            .map(|note| note.start + note.duration)
            .fold(0.0, f64::max);
        let tail = self.envelope.extra_samples(format).floor() as usize;
        let mut buffers = silent_buffers(format.channels, last_end.floor() as usize + tail);

        for note in &sorted {
            self.write_note(format, note, &mut buffers)?;
        }
        Ok(buffers)
    }
}

fn validate(note: &Note) -> Result<()> {
    if !note.start.is_finite() || note.start < 0.0 {
        return Err(SynthError::InvalidNote(format!(
            "start must be a finite sample index, got {}",
            note.start
        )));
    }
    // NaN fails this too
    if !(note.duration >= 0.0) {
        return Err(SynthError::InvalidNote(format!(
            "duration must not be negative, got {}",
            note.duration
        )));
    }
    Ok(())
}
