//! Pitch scale notation for voices.
//!
//! ```text
//! (missing) or {}              A4 major
//! "C#5h"                       tonic C#5, harmonic minor
//! [60, 64, "G4"]               explicit pitches
//! {"base": "D3", "intervals": ["I", "iii", "V", 10]}
//! ```
//!
//! Note names put C4 at 60. Mode letters: `M` major (the default), `m`
//! natural minor, `h` harmonic minor, `p` major pentatonic. Roman numerals
//! name major-scale degrees; lowercase lowers the degree by a semitone.

use serde_json::Value;

use crate::error::{Result, SynthError};
use crate::synth::scale::{UniformScale, HARMONIC_MINOR, MAJOR, MAJOR_PENTATONIC, NATURAL_MINOR};

pub fn parse_scale(value: Option<&Value>) -> Result<UniformScale> {
    match value {
        None | Some(Value::Null) => Ok(UniformScale::a4_major()),
        Some(Value::Object(map)) if map.is_empty() => Ok(UniformScale::a4_major()),
        Some(Value::String(text)) => {
            let (tonic, rest) = split_note(text).map_err(invalid)?;
            let intervals: &[f64] = match rest {
                "" | "M" => &MAJOR,
                "m" => &NATURAL_MINOR,
                "h" => &HARMONIC_MINOR,
                "p" => &MAJOR_PENTATONIC,
                other => return Err(invalid(format!("unknown mode \"{other}\" in \"{text}\""))),
            };
            UniformScale::from_intervals(tonic, intervals)
        }
        Some(Value::Array(items)) => {
            let pitches = items.iter().map(pitch).collect::<Result<Vec<_>>>()?;
            UniformScale::new(pitches)
        }
        Some(Value::Object(map)) => {
            let base = map
                .get("base")
                .ok_or_else(|| invalid("scale object needs a \"base\"".to_string()))
                .and_then(pitch)?;
            let intervals = match map.get("intervals") {
                None => MAJOR.to_vec(),
                Some(Value::Array(items)) => items.iter().map(interval).collect::<Result<Vec<_>>>()?,
                Some(other) => return Err(invalid(format!("intervals must be a list, got {other}"))),
            };
            UniformScale::from_intervals(base, &intervals)
        }
        Some(other) => Err(invalid(format!("unsupported scale {other}"))),
    }
}

/// MIDI pitch of a note name such as `"C4"` (60), `"F#3"` or `"Bb-1"`.
pub fn note_pitch(name: &str) -> Result<f64> {
    match split_note(name).map_err(invalid)? {
        (pitch, "") => Ok(pitch),
        (_, rest) => Err(invalid(format!("trailing \"{rest}\" after note in \"{name}\""))),
    }
}

/// Semitones above the tonic for a Roman numeral degree.
pub fn roman_interval(numeral: &str) -> Option<f64> {
    let degree = match numeral.to_ascii_uppercase().as_str() {
        "I" => 0.0,
        "II" => 2.0,
        "III" => 4.0,
        "IV" => 5.0,
        "V" => 7.0,
        "VI" => 9.0,
        "VII" => 11.0,
        _ => return None,
    };
    if numeral.chars().all(|c| c.is_ascii_lowercase()) {
        Some(degree - 1.0)
    } else if numeral.chars().all(|c| c.is_ascii_uppercase()) {
        Some(degree)
    } else {
        None
    }
}

fn split_note(text: &str) -> std::result::Result<(f64, &str), String> {
    let mut chars = text.char_indices().peekable();
    let base = match chars.next() {
        Some((_, letter)) => match letter {
            'C' => 0,
            'D' => 2,
            'E' => 4,
            'F' => 5,
            'G' => 7,
            'A' => 9,
            'B' => 11,
            _ => return Err(format!("\"{text}\" does not start with a note letter")),
        },
        None => return Err("empty note name".to_string()),
    };

    let mut accidental = 0;
    while let Some(&(_, c)) = chars.peek() {
        match c {
            '#' => accidental += 1,
            'b' => accidental -= 1,
            _ => break,
        }
        chars.next();
    }

    let octave_start = chars.peek().map_or(text.len(), |&(i, _)| i);
    let digits_end = text[octave_start..]
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && c == '-')))
        .map_or(text.len(), |(i, _)| octave_start + i);
    let octave: i32 = text[octave_start..digits_end]
        .parse()
        .map_err(|_| format!("\"{text}\" has no octave number"))?;

    let pitch = 12 * (octave + 1) + base + accidental;
    Ok((f64::from(pitch), &text[digits_end..]))
}

fn pitch(value: &Value) -> Result<f64> {
    match value {
        Value::Number(n) => n.as_f64().ok_or_else(|| invalid(format!("unrepresentable pitch {n}"))),
        Value::String(name) => note_pitch(name),
        other => Err(invalid(format!("expected a pitch, got {other}"))),
    }
}

fn interval(value: &Value) -> Result<f64> {
    match value {
        Value::Number(n) => n.as_f64().ok_or_else(|| invalid(format!("unrepresentable interval {n}"))),
        Value::String(numeral) => {
            roman_interval(numeral).ok_or_else(|| invalid(format!("unknown degree \"{numeral}\"")))
        }
        other => Err(invalid(format!("expected an interval, got {other}"))),
    }
}

fn invalid(reason: String) -> SynthError {
    SynthError::InvalidField {
        component: "voice".to_string(),
        field: "scale",
        reason,
    }
}
