//! Building graphs, instruments and voices from patch documents.
//!
//! A patch is a JSON tree. Every component object carries a `"type"` that
//! selects its constructor in a [ComponentTable], and may carry a `"name"`
//! that registers it for `copy_generator` / `copy_filter` references.
//!
//! ```json
//! {
//!   "instrument": {
//!     "type": "ears",
//!     "left":  { "type": "sin", "name": "A" },
//!     "right": { "type": "copy_generator", "copies": "A" }
//!   },
//!   "envelope": { "type": "adsr", "attack": 0.01, "decay": 0.1, "sustain": 0.7, "release": 0.3 }
//! }
//! ```
//!
//! Construction runs in two passes. Pass 1 builds the tree depth first and
//! registers named components as they complete. Pass 2 binds every copy to
//! the component its name resolved to, so a copy may appear before the
//! component it refers to.

use std::rc::Rc;

use serde_json::Value;

use crate::config::{RngSource, SynthConfig, SynthRng};
use crate::error::{Result, SynthError};
use crate::graph::envelope::{Envelope, UnityEnvelope};
use crate::graph::node::{AudioFormat, Filter, Generator};
use crate::graph::oscillator::Linear;
use crate::graph::reference::{
    Binding, CopyFilter, CopyGenerator, NamedNode, Registry, SharedFilter, SharedGenerator, WeakFilterCell,
    WeakGeneratorCell,
};
use crate::synth::{Instrument, NoteType, PitchScale, Voice};

pub mod expression;
pub mod fields;
pub mod scale;
pub mod table;

pub use fields::Fields;
pub use table::{ComponentTable, Constructor};

/// What a constructor produces.
pub enum Component {
    Generator(Box<dyn Generator>),
    Filter(Box<dyn Filter>),
    Envelope(Rc<dyn Envelope>),
}

impl Component {
    pub fn kind(&self) -> &'static str {
        match self {
            Component::Generator(_) => "generator",
            Component::Filter(_) => "filter",
            Component::Envelope(_) => "envelope",
        }
    }

    fn wrong_kind(&self, component: &str, expected: &'static str) -> SynthError {
        SynthError::WrongKind {
            name: component.to_string(),
            expected,
            found: self.kind(),
        }
    }
}

/// State for one top-level build: the registry, pending copies and the
/// random source every stochastic component draws from.
pub struct BuildContext<'t> {
    table: &'t ComponentTable,
    format: AudioFormat,
    rngs: RngSource,
    registry: Registry,
    pending_generators: Vec<(String, Binding<WeakGeneratorCell>)>,
    pending_filters: Vec<(String, Binding<WeakFilterCell>)>,
}

impl<'t> BuildContext<'t> {
    pub fn new(table: &'t ComponentTable, config: &SynthConfig) -> Self {
        Self {
            table,
            format: config.format(),
            rngs: config.rng_source(),
            registry: Registry::new(),
            pending_generators: Vec::new(),
            pending_filters: Vec::new(),
        }
    }

    pub fn format(&self) -> &AudioFormat {
        &self.format
    }

    pub fn next_rng(&mut self) -> SynthRng {
        self.rngs.next_rng()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Pass 1 for one component object.
    pub fn build(&mut self, value: &Value) -> Result<Component> {
        let fields = Fields::of(value)?;
        let kind = fields.component();
        let constructor = self
            .table
            .get(kind)
            .ok_or_else(|| SynthError::UnknownComponent(kind.to_string()))?;
        let name = fields.opt_str("name")?;
        log::debug!("building {kind}{}", name.map(|n| format!(" \"{n}\"")).unwrap_or_default());

        let component = constructor(self, &fields)?;
        Ok(match name {
            Some(name) => self.register(name, component),
            None => component,
        })
    }

    pub fn generator(&mut self, value: &Value) -> Result<Box<dyn Generator>> {
        match self.build(value)? {
            Component::Generator(generator) => Ok(generator),
            other => Err(other.wrong_kind(component_type(value), "generator")),
        }
    }

    pub fn filter(&mut self, value: &Value) -> Result<Box<dyn Filter>> {
        match self.build(value)? {
            Component::Filter(filter) => Ok(filter),
            other => Err(other.wrong_kind(component_type(value), "filter")),
        }
    }

    pub fn envelope(&mut self, value: &Value) -> Result<Rc<dyn Envelope>> {
        match self.build(value)? {
            Component::Envelope(envelope) => Ok(envelope),
            other => Err(other.wrong_kind(component_type(value), "envelope")),
        }
    }

    /// The `"generator"` child, or a plain phase ramp when it is absent.
    pub fn child_generator(&mut self, fields: &Fields) -> Result<Box<dyn Generator>> {
        match fields.get("generator") {
            Some(value) => self.generator(value),
            None => Ok(Box::new(Linear::new())),
        }
    }

    pub fn filters(&mut self, fields: &Fields, key: &'static str) -> Result<Vec<Box<dyn Filter>>> {
        fields.list(key)?.iter().map(|value| self.filter(value)).collect()
    }

    /// Put `component` in the registry and return the handle that replaces
    /// it in the tree.
    pub fn register(&mut self, name: &str, component: Component) -> Component {
        match component {
            Component::Generator(generator) => Component::Generator(self.share_generator(name, generator)),
            Component::Filter(filter) => {
                let shared = SharedFilter::new(name, filter);
                self.registry.insert(name, NamedNode::Filter(shared.cell()));
                Component::Filter(Box::new(shared))
            }
            Component::Envelope(envelope) => {
                self.registry.insert(name, NamedNode::Envelope(Rc::clone(&envelope)));
                Component::Envelope(envelope)
            }
        }
    }

    pub fn share_generator(&mut self, name: &str, generator: Box<dyn Generator>) -> Box<dyn Generator> {
        let shared = SharedGenerator::new(name, generator);
        self.registry.insert(name, NamedNode::Generator(shared.cell()));
        Box::new(shared)
    }

    pub fn copy_generator(&mut self, name: &str) -> CopyGenerator {
        let copy = CopyGenerator::new(name);
        self.pending_generators.push((name.to_string(), copy.binding()));
        copy
    }

    pub fn copy_filter(&mut self, name: &str) -> CopyFilter {
        let copy = CopyFilter::new(name);
        self.pending_filters.push((name.to_string(), copy.binding()));
        copy
    }

    /// Pass 2: point every copy at the component its name resolved to.
    pub fn resolve(&mut self) -> Result<()> {
        for (name, binding) in self.pending_generators.drain(..) {
            let cell = self.registry.generator(&name)?;
            log::debug!("binding copy of generator \"{name}\"");
            // A binding is only ever filled here
            let _ = binding.set(Rc::downgrade(&cell));
        }
        for (name, binding) in self.pending_filters.drain(..) {
            let cell = self.registry.filter(&name)?;
            log::debug!("binding copy of filter \"{name}\"");
            let _ = binding.set(Rc::downgrade(&cell));
        }
        Ok(())
    }

    /// Build `{"instrument": ..., "envelope": ...}` and resolve references.
    pub fn instrument(&mut self, doc: &Value) -> Result<Instrument> {
        let fields = Fields::untyped("instrument", doc)?;
        let generator = self.generator(fields.required("instrument")?)?;
        let envelope: Rc<dyn Envelope> = match fields.get("envelope") {
            Some(value) => self.envelope(value)?,
            None => Rc::new(UnityEnvelope),
        };
        self.resolve()?;
        Ok(Instrument::new(generator)
            .with_envelope(envelope)
            .with_registry(self.registry.clone()))
    }
}

fn component_type(value: &Value) -> &str {
    value.get("type").and_then(Value::as_str).unwrap_or("component")
}

/// Entry point for turning patch documents into playable objects.
pub struct Builder<'a> {
    table: &'a ComponentTable,
    config: &'a SynthConfig,
}

impl<'a> Builder<'a> {
    pub fn new(table: &'a ComponentTable, config: &'a SynthConfig) -> Self {
        Self { table, config }
    }

    /// A single component tree with its references resolved.
    pub fn build_generator(&self, value: &Value) -> Result<(Box<dyn Generator>, Registry)> {
        let mut ctx = BuildContext::new(self.table, self.config);
        let generator = ctx.generator(value)?;
        ctx.resolve()?;
        Ok((generator, ctx.registry))
    }

    pub fn build_instrument(&self, doc: &Value) -> Result<Instrument> {
        BuildContext::new(self.table, self.config).instrument(doc)
    }

    pub fn build_instrument_str(&self, json: &str) -> Result<Instrument> {
        self.build_instrument(&serde_json::from_str(json)?)
    }

    /// A voice document: `instrument` plus `volume`, `speed`, `scale`,
    /// `type` and `note_prob`.
    pub fn build_voice(&self, doc: &Value) -> Result<Voice> {
        let fields = Fields::untyped("voice", doc)?;
        let mut ctx = BuildContext::new(self.table, self.config);
        let rng = ctx.next_rng();
        let instrument = ctx.instrument(fields.required("instrument")?)?;

        let note_type: NoteType = fields.enum_or("type", NoteType::default())?;
        let scale = scale::parse_scale(fields.get("scale"))?;
        log::debug!("built {note_type:?} voice over {} pitches", scale.pitches().len());

        Ok(Voice::new(instrument, note_type, rng)
            .with_scale(Box::new(scale))
            .with_volume(fields.f64_or("volume", 1.0)?)
            .with_speed(fields.f64_or("speed", 1.0)?)
            .with_note_prob(fields.f64_or("note_prob", 1.0)?))
    }

    pub fn build_voice_str(&self, json: &str) -> Result<Voice> {
        self.build_voice(&serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::node::{silent_buffers, Note};
    use serde_json::json;

    fn build(value: Value) -> Result<(Box<dyn Generator>, Registry)> {
        let table = ComponentTable::standard();
        let config = SynthConfig::seeded(5);
        Builder::new(&table, &config).build_generator(&value)
    }

    #[test]
    fn test_unknown_type() {
        assert!(matches!(
            build(json!({"type": "theremin"})),
            Err(SynthError::UnknownComponent(kind)) if kind == "theremin"
        ));
    }

    #[test]
    fn test_filter_where_generator_expected() {
        assert!(matches!(
            build(json!({"type": "scale", "scale": 2.0})),
            Err(SynthError::WrongKind { expected: "generator", found: "filter", .. })
        ));
    }

    #[test]
    fn test_unresolved_copy() {
        assert!(matches!(
            build(json!({"type": "sin", "generator": {"type": "copy_generator", "copies": "nowhere"}})),
            Err(SynthError::UnresolvedReference(name)) if name == "nowhere"
        ));
    }

    #[test]
    fn test_self_copy_reports_and_frees() {
        let (mut generator, registry) = build(json!({
            "type": "sin",
            "name": "loop",
            "generator": {"type": "copy_generator", "copies": "loop"}
        }))
        .unwrap();
        let format = AudioFormat::new(44_100.0, 1);
        let mut buffers = silent_buffers(1, 4);
        assert!(matches!(
            generator.generate(&format, &Note::new(69.0, 1.0, 0.0, 4.0), 4, &mut buffers, 0),
            Err(SynthError::ReentrantReference(name)) if name == "loop"
        ));

        let node = Rc::downgrade(&registry.generator("loop").unwrap());
        drop(registry);
        assert!(node.upgrade().is_some());
        drop(generator);
        assert!(node.upgrade().is_none());
    }

    #[test]
    fn test_copy_of_filter_name_is_wrong_kind() {
        let patch = json!({
            "type": "apply",
            "generator": {"type": "copy_generator", "copies": "gain"},
            "filter": {"type": "scale", "scale": 0.5, "name": "gain"}
        });
        assert!(matches!(
            build(patch),
            Err(SynthError::WrongKind { expected: "generator", found: "filter", .. })
        ));
    }

    #[test]
    fn test_names_registered() {
        let (_, registry) = build(json!({
            "type": "add",
            "left": {"type": "sin", "name": "low"},
            "right": {"type": "saw", "name": "high"}
        }))
        .unwrap();
        let mut names: Vec<&str> = registry.names().collect();
        names.sort_unstable();
        assert_eq!(names, vec!["high", "low"]);
    }

    #[test]
    fn test_instrument_needs_instrument_field() {
        let table = ComponentTable::standard();
        let config = SynthConfig::default();
        let builder = Builder::new(&table, &config);
        assert!(matches!(
            builder.build_instrument(&json!({"envelope": {"type": "adsr"}})),
            Err(SynthError::MissingField { field: "instrument", .. })
        ));
        assert!(matches!(builder.build_instrument_str("{not json"), Err(SynthError::Parse(_))));
    }

    #[test]
    fn test_instrument_with_envelope() {
        let table = ComponentTable::standard();
        let config = SynthConfig {
            sample_rate: 100.0,
            channels: 1,
            seed: Some(1),
        };
        let mut instrument = Builder::new(&table, &config)
            .build_instrument(&json!({
                "instrument": {"type": "dc", "value": 1.0},
                "envelope": {"type": "adsr", "attack": 0.0, "decay": 0.0, "sustain": 0.5, "release": 0.1}
            }))
            .unwrap();
        assert_eq!(instrument.envelope().extra_samples(&config.format()), 10.0);

        let mut buffers = silent_buffers(1, 40);
        instrument
            .write_note(&config.format(), &Note::new(60.0, 1.0, 0.0, 20.0), &mut buffers)
            .unwrap();
        assert_eq!(buffers[0][10], 0.5);
        assert_eq!(buffers[0][35], 0.0);
    }

    #[test]
    fn test_voice_fields() {
        let table = ComponentTable::standard();
        let config = SynthConfig::seeded(9);
        let voice = Builder::new(&table, &config)
            .build_voice(&json!({
                "instrument": {"instrument": {"type": "sin"}},
                "type": "PLUCK",
                "speed": 4,
                "scale": "C4p"
            }))
            .unwrap();
        assert_eq!(voice.note_type(), NoteType::Pluck);

        assert!(matches!(
            Builder::new(&table, &config).build_voice(&json!({
                "instrument": {"instrument": {"type": "sin"}},
                "type": "SHUFFLE"
            })),
            Err(SynthError::InvalidField { field: "type", .. })
        ));
    }
}
