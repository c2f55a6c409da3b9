use std::collections::HashMap;
use std::f64::consts::PI;
use std::rc::Rc;

use crate::dsp::design::{digital_pzk, FilterKind, Prototype};
use crate::dsp::fir::FirFilter;
use crate::dsp::iir::{BiquadFilter, IirFilter};
use crate::dsp::window::Window;
use crate::error::{Result, SynthError};
use crate::graph::amplify::Multiplication;
use crate::graph::chorus::Chorus;
use crate::graph::delay::LfoDelay;
use crate::graph::envelope::Adsr;
use crate::graph::filter::{ApplyEach, Chain, Scale};
use crate::graph::mix::Addition;
use crate::graph::modifier::{NoteModifier, PitchChange, VolumeChange};
use crate::graph::node::{Filter, Generator};
use crate::graph::noise::WhiteNoise;
use crate::graph::oscillator::{Dc, Linear, Oscillator};
use crate::graph::pluck::KarplusStrong;
use crate::graph::stereo::{ApplyPan, Ears, Pan};
use crate::graph::supersaw::SuperSaw;
use crate::graph::through::Through;
use crate::patch::expression::Expression;
use crate::patch::fields::{parse_cutoff, Fields};
use crate::patch::{BuildContext, Component};

/// Builds one component from its fields.
pub type Constructor = fn(&mut BuildContext<'_>, &Fields<'_>) -> Result<Component>;

/// Immutable map from `"type"` to constructor.
///
/// Build it once and share it; [ComponentTable::with] adds or replaces
/// entries before it is handed to a builder.
#[derive(Clone, Default)]
pub struct ComponentTable {
    constructors: HashMap<&'static str, Constructor>,
}

impl ComponentTable {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Every built-in component type.
    pub fn standard() -> Self {
        Self::empty()
            // Generators
            .with("linear", linear)
            .with("modifier", modifier)
            .with("sin", sin)
            .with("saw", saw)
            .with("square", square)
            .with("noise", noise)
            .with("dc", dc)
            .with("supersaw", supersaw)
            .with("add", add)
            .with("multiply", multiply)
            .with("apply", apply)
            .with("ears", ears)
            .with("pan", pan)
            .with("pluck", pluck)
            .with("binbeat", binbeat)
            .with("monobeat", monobeat)
            .with("isotone", isotone)
            // Filters
            .with("chain", chain)
            .with("iir", iir)
            .with("biquad", biquad)
            .with("fir", fir)
            .with("each", each)
            .with("scale", scale)
            .with("design_iir", design_iir)
            .with("firwin", firwin)
            .with("apply_pan", apply_pan)
            .with("lfo_delay", lfo_delay)
            .with("chorus", chorus)
            // References
            .with("copy_generator", copy_generator)
            .with("copy_filter", copy_filter)
            // Envelopes
            .with("adsr", adsr)
    }

    pub fn with(mut self, kind: &'static str, constructor: Constructor) -> Self {
        self.constructors.insert(kind, constructor);
        self
    }

    pub fn get(&self, kind: &str) -> Option<Constructor> {
        self.constructors.get(kind).copied()
    }

    pub fn kinds(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.constructors.keys().copied()
    }
}

fn generator(g: impl Generator + 'static) -> Result<Component> {
    Ok(Component::Generator(Box::new(g)))
}

fn filter(f: impl Filter + 'static) -> Result<Component> {
    Ok(Component::Filter(Box::new(f)))
}

fn conflict(fields: &Fields, first: &'static str, second: &'static str) -> SynthError {
    SynthError::ConflictingFields {
        component: fields.component().to_string(),
        first,
        second,
    }
}

// ---------------------------------------------------------------------------
// Generators

fn linear(_ctx: &mut BuildContext, _fields: &Fields) -> Result<Component> {
    generator(Linear::new())
}

fn modifier(ctx: &mut BuildContext, fields: &Fields) -> Result<Component> {
    let pitch = fields.opt_f64("frequency")?;
    let semitones = fields.opt_f64("frequency_multiplier")?;
    let hz = fields.opt_f64("frequency_addition")?;
    let volume = fields.opt_f64("volume")?;
    let volume_scale = fields.opt_f64("volume_multiplier")?;

    if pitch.is_some() {
        if semitones.is_some() {
            return Err(conflict(fields, "frequency", "frequency_multiplier"));
        }
        if hz.is_some() {
            return Err(conflict(fields, "frequency", "frequency_addition"));
        }
    }
    if volume.is_some() && volume_scale.is_some() {
        return Err(conflict(fields, "volume", "volume_multiplier"));
    }

    let mut modifier = NoteModifier::new(ctx.child_generator(fields)?);
    if let Some(pitch) = pitch {
        modifier = modifier.with_pitch(PitchChange::Absolute(pitch));
    } else if semitones.is_some() || hz.is_some() {
        modifier = modifier.with_pitch(PitchChange::Relative {
            semitones: semitones.unwrap_or(0.0),
            hz: hz.unwrap_or(0.0),
        });
    }
    if let Some(volume) = volume {
        modifier = modifier.with_volume(VolumeChange::Absolute(volume));
    } else if let Some(factor) = volume_scale {
        modifier = modifier.with_volume(VolumeChange::Scale(factor));
    }
    generator(modifier)
}

fn sin(ctx: &mut BuildContext, fields: &Fields) -> Result<Component> {
    generator(Oscillator::sine(ctx.child_generator(fields)?))
}

fn saw(ctx: &mut BuildContext, fields: &Fields) -> Result<Component> {
    generator(Oscillator::saw(ctx.child_generator(fields)?))
}

fn square_wave(ctx: &mut BuildContext, fields: &Fields) -> Result<Oscillator<Box<dyn Generator>>> {
    let duty = fields.f64_or("duty", 0.5)?;
    Ok(Oscillator::square(ctx.child_generator(fields)?, duty))
}

fn square(ctx: &mut BuildContext, fields: &Fields) -> Result<Component> {
    generator(square_wave(ctx, fields)?)
}

fn noise(ctx: &mut BuildContext, _fields: &Fields) -> Result<Component> {
    generator(WhiteNoise::new(ctx.next_rng()))
}

fn dc(_ctx: &mut BuildContext, fields: &Fields) -> Result<Component> {
    generator(Dc::new(fields.f64("value")?))
}

fn supersaw(ctx: &mut BuildContext, fields: &Fields) -> Result<Component> {
    let detunes = fields.f64_list("detunes")?;
    let weights = fields.f64_list_or("scales", &[])?;
    generator(SuperSaw::new(ctx.child_generator(fields)?, detunes, weights))
}

fn add(ctx: &mut BuildContext, fields: &Fields) -> Result<Component> {
    let left = ctx.generator(fields.required("left")?)?;
    let right = ctx.generator(fields.required("right")?)?;
    generator(Addition::new(left, right))
}

fn multiply(ctx: &mut BuildContext, fields: &Fields) -> Result<Component> {
    let left = ctx.generator(fields.required("left")?)?;
    let right = ctx.generator(fields.required("right")?)?;
    generator(Multiplication::new(left, right))
}

fn apply(ctx: &mut BuildContext, fields: &Fields) -> Result<Component> {
    let source = ctx.child_generator(fields)?;
    let effect = ctx.filter(fields.required("filter")?)?;
    generator(Through::new(source, effect))
}

fn ears(ctx: &mut BuildContext, fields: &Fields) -> Result<Component> {
    let left = fields.get("left").map(|v| ctx.generator(v)).transpose()?;
    let right = fields.get("right").map(|v| ctx.generator(v)).transpose()?;
    generator(Ears::new(left, right))
}

fn pan(ctx: &mut BuildContext, fields: &Fields) -> Result<Component> {
    let left = fields.f64("left")?;
    let right = fields.f64("right")?;
    generator(Pan::new(ctx.child_generator(fields)?, left, right))
}

fn pluck(ctx: &mut BuildContext, fields: &Fields) -> Result<Component> {
    let impulse = ctx.child_generator(fields)?;
    let mut string = KarplusStrong::new(impulse, ctx.next_rng()).with_drum(fields.f64_or("drum", 0.0)?);
    if fields.has("decay") {
        string = string.with_decay(Expression::parse(fields.list("decay")?)?.into_curve());
    }
    if fields.has("stretch") {
        string = string.with_stretch(Expression::parse(fields.list("stretch")?)?.into_curve());
    }
    generator(string)
}

/// The child in the left ear, a second build of it shifted by `frequency`
/// Hz in the right.
fn binbeat(ctx: &mut BuildContext, fields: &Fields) -> Result<Component> {
    let hz = fields.f64_or("frequency", 0.0)?;
    let left = ctx.child_generator(fields)?;
    let right = ctx.child_generator(fields)?;
    generator(Ears::new(Some(left), Some(NoteModifier::detuned(right, hz))))
}

/// Like `binbeat` but summed into every channel at half volume each.
fn monobeat(ctx: &mut BuildContext, fields: &Fields) -> Result<Component> {
    let hz = fields.f64_or("frequency", 0.0)?;
    let left = NoteModifier::new(ctx.child_generator(fields)?).with_volume(VolumeChange::Scale(0.5));
    let right = NoteModifier::detuned(ctx.child_generator(fields)?, hz).with_volume(VolumeChange::Scale(0.5));
    generator(Addition::new(left, right))
}

/// The child gated by a square at pitch `frequency`, raised to swing
/// between 0 and 1. A named isotone also registers its gate as
/// `<name>_square_filtered`.
fn isotone(ctx: &mut BuildContext, fields: &Fields) -> Result<Component> {
    let tone = ctx.child_generator(fields)?;
    let square_fields = Fields::untyped("square", fields.required("square")?)?;
    let pitch = fields.f64_or("frequency", 1.0)?;

    let gate = NoteModifier::new(square_wave(ctx, &square_fields)?)
        .with_pitch(PitchChange::Absolute(pitch))
        .with_volume(VolumeChange::Absolute(0.5));
    let mut gate: Box<dyn Generator> = Box::new(gate);
    if let Some(name) = fields.opt_str("name")? {
        gate = ctx.share_generator(&format!("{name}_square_filtered"), gate);
    }
    generator(Multiplication::new(tone, Addition::new(gate, Dc::new(0.5))))
}

// ---------------------------------------------------------------------------
// Filters

fn chain(ctx: &mut BuildContext, fields: &Fields) -> Result<Component> {
    filter(Chain::new(ctx.filters(fields, "filters")?))
}

fn each(ctx: &mut BuildContext, fields: &Fields) -> Result<Component> {
    filter(ApplyEach::new(ctx.filters(fields, "filters")?))
}

fn iir(_ctx: &mut BuildContext, fields: &Fields) -> Result<Component> {
    let a = fields.f64_list_or("a", &[1.0])?;
    let b = fields.f64_list_or("b", &[1.0])?;
    filter(IirFilter::new(a, b)?)
}

fn section(fields: &Fields, key: &'static str) -> Result<[f64; 3]> {
    let coefficients = fields.f64_list_or(key, &[1.0, 0.0, 0.0])?;
    coefficients
        .try_into()
        .map_err(|c: Vec<f64>| fields.invalid(key, format!("a biquad takes 3 coefficients, got {}", c.len())))
}

fn biquad(_ctx: &mut BuildContext, fields: &Fields) -> Result<Component> {
    filter(BiquadFilter::new(section(fields, "a")?, section(fields, "b")?))
}

fn fir(_ctx: &mut BuildContext, fields: &Fields) -> Result<Component> {
    filter(FirFilter::new(fields.f64_list_or("coefficients", &[1.0])?)?)
}

fn scale(_ctx: &mut BuildContext, fields: &Fields) -> Result<Component> {
    filter(Scale::new(fields.f64("scale")?))
}

fn design_iir(ctx: &mut BuildContext, fields: &Fields) -> Result<Component> {
    let prototype: Prototype = fields.required_enum("prototype")?;
    let kind = fields.enum_or("filter", FilterKind::Lowpass)?;
    let degree = fields.usize("degree")?;
    if degree == 0 {
        return Err(fields.invalid("degree", "must be at least 1"));
    }
    let rate = ctx.format().sample_rate;
    let cutoff = fields.cutoff("cutoff", rate)?;
    let secondary = fields.opt_cutoff("secondaryCutoff", rate)?;

    let pzk = digital_pzk(prototype, degree, kind, cutoff, secondary)?;
    if fields.bool_or("biquads", true)? {
        filter(Chain::new(BiquadFilter::cascade(&pzk.poles, &pzk.zeros, pzk.gain)?))
    } else {
        filter(IirFilter::from_pzk(&pzk.poles, &pzk.zeros, pzk.gain)?)
    }
}

/// Band edges use the cutoff notation and are handed to the design as
/// fractions of Nyquist.
fn firwin(ctx: &mut BuildContext, fields: &Fields) -> Result<Component> {
    let degree = fields.usize("degree")?;
    let window = fields.enum_or("window", Window::Boxcar)?;
    let rate = ctx.format().sample_rate;
    let bands = fields
        .list("cutoffs")?
        .iter()
        .map(|v| {
            parse_cutoff(v, rate)
                .map(|omega| omega / PI)
                .map_err(|reason| fields.invalid("cutoffs", reason))
        })
        .collect::<Result<Vec<_>>>()?;
    filter(FirFilter::windowed(degree, &bands, window)?)
}

fn apply_pan(ctx: &mut BuildContext, fields: &Fields) -> Result<Component> {
    let left = fields.get("left").map(|v| ctx.filter(v)).transpose()?;
    let right = fields.get("right").map(|v| ctx.filter(v)).transpose()?;
    filter(ApplyPan::new(left, right))
}

fn lfo_delay(_ctx: &mut BuildContext, fields: &Fields) -> Result<Component> {
    filter(LfoDelay::new(fields.f64("frequency")?, fields.f64("depth")?)?)
}

fn chorus(_ctx: &mut BuildContext, fields: &Fields) -> Result<Component> {
    if !fields.has("delays") {
        let size = fields.usize("size")?;
        return filter(Chorus::uniform(fields.f64("frequency")?, fields.f64("depth")?, size)?);
    }
    let voices = fields
        .list("delays")?
        .iter()
        .map(|voice| match voice.as_array().map(Vec::as_slice) {
            Some([frequency, depth, weight]) => Ok((
                fields.number("delays", frequency)?,
                fields.number("delays", depth)?,
                fields.number("delays", weight)?,
            )),
            _ => Err(fields.invalid("delays", format!("expected [frequency, depth, weight], got {voice}"))),
        })
        .collect::<Result<Vec<_>>>()?;
    filter(Chorus::new(&voices)?)
}

// ---------------------------------------------------------------------------
// References and envelopes

fn copy_generator(ctx: &mut BuildContext, fields: &Fields) -> Result<Component> {
    generator(ctx.copy_generator(fields.str("copies")?))
}

fn copy_filter(ctx: &mut BuildContext, fields: &Fields) -> Result<Component> {
    filter(ctx.copy_filter(fields.str("copies")?))
}

fn adsr(_ctx: &mut BuildContext, fields: &Fields) -> Result<Component> {
    Ok(Component::Envelope(Rc::new(Adsr::new(
        fields.f64("attack")?,
        fields.f64("decay")?,
        fields.f64("sustain")?,
        fields.f64("release")?,
    ))))
}
