use crate::error::{Result, SynthError};

/// One channel of samples. Nominally in [-1, 1] but never clamped.
pub type AudioBuffer = Vec<f64>;

/// Convert a MIDI-style pitch to frequency in Hz.
/// A4 = 440 Hz = pitch 69
#[inline]
pub fn pitch_to_freq(pitch: f64) -> f64 {
    440.0 * 2.0_f64.powf((pitch - 69.0) / 12.0)
}

/// Shape of the buffers a graph renders into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioFormat {
    pub sample_rate: f64,
    pub channels: usize,
}

impl AudioFormat {
    pub fn new(sample_rate: f64, channels: usize) -> Self {
        Self {
            sample_rate,
            channels,
        }
    }

    /// Same rate, one channel. Used by stereo nodes that split their work.
    pub fn mono(&self) -> Self {
        Self {
            sample_rate: self.sample_rate,
            channels: 1,
        }
    }
}

/// A note to render.
///
/// - pitch: semitones, 69 = 440 Hz, may be fractional
/// - volume: nominally 0.0-1.0
/// - start: sample index of the note onset, fractional allowed
/// - duration: samples alive before release
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Note {
    pub pitch: f64,
    pub volume: f64,
    pub start: f64,
    pub duration: f64,
}

impl Note {
    pub fn new(pitch: f64, volume: f64, start: f64, duration: f64) -> Self {
        Self {
            pitch,
            volume,
            start,
            duration,
        }
    }

    pub fn frequency(&self) -> f64 {
        pitch_to_freq(self.pitch)
    }

    /// Copy that never starts late and never ends, used to render a release tail.
    pub fn living(&self) -> Self {
        Self {
            start: f64::NEG_INFINITY,
            duration: f64::INFINITY,
            ..*self
        }
    }

    pub fn with_pitch(&self, pitch: f64) -> Self {
        Self { pitch, ..*self }
    }

    pub fn with_volume(&self, volume: f64) -> Self {
        Self { volume, ..*self }
    }

    /// Whether elapsed note-local sample `t` falls inside `[start, duration)`.
    #[inline]
    pub fn sounding_at(&self, t: f64) -> bool {
        t >= self.start && t < self.duration
    }
}

/// Produces audio for a note.
///
/// Calls for one note must cover contiguous, increasing sample ranges:
/// phase accumulators and histories assume it. Nodes are not `Sync` and a
/// graph instance must only be driven from one place at a time.
pub trait Generator {
    /// Write `num_samples` samples into every channel of `outputs` starting
    /// at `offset`. Returns whether the note is still alive after this chunk.
    fn generate(
        &mut self,
        format: &AudioFormat,
        note: &Note,
        num_samples: usize,
        outputs: &mut [AudioBuffer],
        offset: usize,
    ) -> Result<bool>;
}

/// Transforms an input buffer set into an output buffer set.
pub trait Filter {
    fn filter(
        &mut self,
        format: &AudioFormat,
        num_samples: usize,
        inputs: &[AudioBuffer],
        offset_in: usize,
        outputs: &mut [AudioBuffer],
        offset_out: usize,
    ) -> Result<()>;

    /// Filter `buffers[offset..offset + num_samples]` in place.
    ///
    /// Default implementation copies the span out first; filters whose
    /// per-sample update only reads history can override it.
    fn filter_in_place(
        &mut self,
        format: &AudioFormat,
        num_samples: usize,
        buffers: &mut [AudioBuffer],
        offset: usize,
    ) -> Result<()> {
        let inputs = copy_span(buffers, offset, num_samples)?;
        self.filter(format, num_samples, &inputs, 0, buffers, offset)
    }
}

/// Allow boxed generators to be used as generators (for dynamic dispatch)
impl Generator for Box<dyn Generator> {
    fn generate(
        &mut self,
        format: &AudioFormat,
        note: &Note,
        num_samples: usize,
        outputs: &mut [AudioBuffer],
        offset: usize,
    ) -> Result<bool> {
        (**self).generate(format, note, num_samples, outputs, offset)
    }
}

impl Filter for Box<dyn Filter> {
    fn filter(
        &mut self,
        format: &AudioFormat,
        num_samples: usize,
        inputs: &[AudioBuffer],
        offset_in: usize,
        outputs: &mut [AudioBuffer],
        offset_out: usize,
    ) -> Result<()> {
        (**self).filter(format, num_samples, inputs, offset_in, outputs, offset_out)
    }

    fn filter_in_place(
        &mut self,
        format: &AudioFormat,
        num_samples: usize,
        buffers: &mut [AudioBuffer],
        offset: usize,
    ) -> Result<()> {
        (**self).filter_in_place(format, num_samples, buffers, offset)
    }
}

/// `channels` zeroed buffers of `len` samples.
pub fn silent_buffers(channels: usize, len: usize) -> Vec<AudioBuffer> {
    vec![vec![0.0; len]; channels]
}

/// Reuse `scratch` as `channels` zeroed buffers of `len` samples, growing it
/// only when a call needs more room than any call before it.
pub fn zeroed_scratch(scratch: &mut Vec<AudioBuffer>, channels: usize, len: usize) -> &mut [AudioBuffer] {
    scratch.resize_with(channels.max(scratch.len()), Vec::new);
    for buffer in scratch.iter_mut().take(channels) {
        buffer.clear();
        buffer.resize(len, 0.0);
    }
    &mut scratch[..channels]
}

/// Fail unless the buffer set has exactly the format's channel count.
pub fn check_channels(format: &AudioFormat, buffers: &[AudioBuffer]) -> Result<()> {
    if buffers.len() != format.channels {
        return Err(SynthError::ChannelMismatch {
            expected: format.channels,
            found: buffers.len(),
        });
    }
    Ok(())
}

/// Fail unless every buffer can hold `offset + num_samples` samples.
pub fn check_span(buffers: &[AudioBuffer], offset: usize, num_samples: usize) -> Result<()> {
    let needed = offset + num_samples;
    match buffers.iter().find(|b| b.len() < needed) {
        Some(short) => Err(SynthError::BufferTooShort {
            needed,
            found: short.len(),
        }),
        None => Ok(()),
    }
}

/// Channel and length checks every filter runs before touching samples.
pub fn check_filter_io(
    format: &AudioFormat,
    num_samples: usize,
    inputs: &[AudioBuffer],
    offset_in: usize,
    outputs: &[AudioBuffer],
    offset_out: usize,
) -> Result<()> {
    check_channels(format, inputs)?;
    check_channels(format, outputs)?;
    check_span(inputs, offset_in, num_samples)?;
    check_span(outputs, offset_out, num_samples)
}

/// Copy `buffers[..][offset..offset + num_samples]` into fresh buffers.
pub fn copy_span(buffers: &[AudioBuffer], offset: usize, num_samples: usize) -> Result<Vec<AudioBuffer>> {
    check_span(buffers, offset, num_samples)?;
    Ok(buffers
        .iter()
        .map(|b| b[offset..offset + num_samples].to_vec())
        .collect())
}
