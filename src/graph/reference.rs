use std::cell::{OnceCell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use crate::error::{Result, SynthError};
use crate::graph::envelope::Envelope;
use crate::graph::node::{AudioBuffer, AudioFormat, Filter, Generator, Note};

/*
Named References
================

A patch can name a node and use it again elsewhere, including before the
named node has been built:

  ears
  ├── left:  sin  (name: "A")
  └── right: copy_generator (copies: "A")

Named nodes live in a shared cell. The node itself is wrapped in a Shared*
handle at the place it was declared; every Copy* holds a slot that the
builder fills with a weak pointer to the same cell once the whole tree
exists (pass 2).

  Shared("A") ──── strong ──┐
  Registry ─────── strong ──┼──→ RefCell<Box<dyn Generator>>
  Copy("A") ────── weak ────┘    (slot bound in pass 2)

A copy nested inside the node it copies therefore never keeps that node
alive, and the graph is freed with its root.

Calls through either handle drive the SAME node: phase and filter history
are shared, so the copy continues where the original stopped. A copy used
before binding is an error, and so is a node that reaches itself while it
is already rendering.
*/

pub type GeneratorCell = Rc<RefCell<Box<dyn Generator>>>;
pub type FilterCell = Rc<RefCell<Box<dyn Filter>>>;
pub type WeakGeneratorCell = Weak<RefCell<Box<dyn Generator>>>;
pub type WeakFilterCell = Weak<RefCell<Box<dyn Filter>>>;

/// Slot a copy reads its target from, filled once.
pub type Binding<T> = Rc<OnceCell<T>>;

/// Anything a patch can give a name to.
#[derive(Clone)]
pub enum NamedNode {
    Generator(GeneratorCell),
    Filter(FilterCell),
    Envelope(Rc<dyn Envelope>),
}

impl NamedNode {
    pub fn kind(&self) -> &'static str {
        match self {
            NamedNode::Generator(_) => "generator",
            NamedNode::Filter(_) => "filter",
            NamedNode::Envelope(_) => "envelope",
        }
    }
}

/// Names assigned while building a patch.
///
/// Registering a name twice keeps the later node.
#[derive(Clone, Default)]
pub struct Registry {
    nodes: HashMap<String, NamedNode>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, node: NamedNode) {
        let name = name.into();
        log::debug!("registering {} \"{name}\"", node.kind());
        if let Some(previous) = self.nodes.insert(name.clone(), node) {
            log::warn!("\"{name}\" was already registered as a {}, replacing it", previous.kind());
        }
    }

    pub fn get(&self, name: &str) -> Option<&NamedNode> {
        self.nodes.get(name)
    }

    pub fn generator(&self, name: &str) -> Result<GeneratorCell> {
        match self.lookup(name)? {
            NamedNode::Generator(cell) => Ok(Rc::clone(cell)),
            other => Err(wrong_kind(name, "generator", other)),
        }
    }

    pub fn filter(&self, name: &str) -> Result<FilterCell> {
        match self.lookup(name)? {
            NamedNode::Filter(cell) => Ok(Rc::clone(cell)),
            other => Err(wrong_kind(name, "filter", other)),
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn lookup(&self, name: &str) -> Result<&NamedNode> {
        self.nodes
            .get(name)
            .ok_or_else(|| SynthError::UnresolvedReference(name.to_string()))
    }
}

fn wrong_kind(name: &str, expected: &'static str, found: &NamedNode) -> SynthError {
    SynthError::WrongKind {
        name: name.to_string(),
        expected,
        found: found.kind(),
    }
}

/// A named generator at its declaration site.
pub struct SharedGenerator {
    name: String,
    cell: GeneratorCell,
}

impl SharedGenerator {
    pub fn new(name: impl Into<String>, generator: Box<dyn Generator>) -> Self {
        Self {
            name: name.into(),
            cell: Rc::new(RefCell::new(generator)),
        }
    }

    pub fn cell(&self) -> GeneratorCell {
        Rc::clone(&self.cell)
    }
}

fn generate_through(
    name: &str,
    cell: &GeneratorCell,
    format: &AudioFormat,
    note: &Note,
    num_samples: usize,
    outputs: &mut [AudioBuffer],
    offset: usize,
) -> Result<bool> {
    let mut generator = cell
        .try_borrow_mut()
        .map_err(|_| SynthError::ReentrantReference(name.to_string()))?;
    generator.generate(format, note, num_samples, outputs, offset)
}

impl Generator for SharedGenerator {
    fn generate(
        &mut self,
        format: &AudioFormat,
        note: &Note,
        num_samples: usize,
        outputs: &mut [AudioBuffer],
        offset: usize,
    ) -> Result<bool> {
        generate_through(&self.name, &self.cell, format, note, num_samples, outputs, offset)
    }
}

/// Forward or backward reference to a named generator.
pub struct CopyGenerator {
    name: String,
    target: Binding<WeakGeneratorCell>,
}

impl CopyGenerator {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: Rc::new(OnceCell::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Handle the builder keeps to bind this copy after the tree is built.
    pub fn binding(&self) -> Binding<WeakGeneratorCell> {
        Rc::clone(&self.target)
    }
}

impl Generator for CopyGenerator {
    fn generate(
        &mut self,
        format: &AudioFormat,
        note: &Note,
        num_samples: usize,
        outputs: &mut [AudioBuffer],
        offset: usize,
    ) -> Result<bool> {
        let cell = self
            .target
            .get()
            .and_then(Weak::upgrade)
            .ok_or_else(|| SynthError::UnboundReference(self.name.clone()))?;
        generate_through(&self.name, &cell, format, note, num_samples, outputs, offset)
    }
}

/// A named filter at its declaration site.
pub struct SharedFilter {
    name: String,
    cell: FilterCell,
}

impl SharedFilter {
    pub fn new(name: impl Into<String>, filter: Box<dyn Filter>) -> Self {
        Self {
            name: name.into(),
            cell: Rc::new(RefCell::new(filter)),
        }
    }

    pub fn cell(&self) -> FilterCell {
        Rc::clone(&self.cell)
    }
}

fn borrow_filter<'a>(name: &str, cell: &'a FilterCell) -> Result<std::cell::RefMut<'a, Box<dyn Filter>>> {
    cell.try_borrow_mut()
        .map_err(|_| SynthError::ReentrantReference(name.to_string()))
}

impl Filter for SharedFilter {
    fn filter(
        &mut self,
        format: &AudioFormat,
        num_samples: usize,
        inputs: &[AudioBuffer],
        offset_in: usize,
        outputs: &mut [AudioBuffer],
        offset_out: usize,
    ) -> Result<()> {
        borrow_filter(&self.name, &self.cell)?
            .filter(format, num_samples, inputs, offset_in, outputs, offset_out)
    }

    fn filter_in_place(
        &mut self,
        format: &AudioFormat,
        num_samples: usize,
        buffers: &mut [AudioBuffer],
        offset: usize,
    ) -> Result<()> {
        borrow_filter(&self.name, &self.cell)?.filter_in_place(format, num_samples, buffers, offset)
    }
}

/// Forward or backward reference to a named filter.
pub struct CopyFilter {
    name: String,
    target: Binding<WeakFilterCell>,
}

impl CopyFilter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: Rc::new(OnceCell::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn binding(&self) -> Binding<WeakFilterCell> {
        Rc::clone(&self.target)
    }

    fn target(&self) -> Result<FilterCell> {
        self.target
            .get()
            .and_then(Weak::upgrade)
            .ok_or_else(|| SynthError::UnboundReference(self.name.clone()))
    }
}

impl Filter for CopyFilter {
    fn filter(
        &mut self,
        format: &AudioFormat,
        num_samples: usize,
        inputs: &[AudioBuffer],
        offset_in: usize,
        outputs: &mut [AudioBuffer],
        offset_out: usize,
    ) -> Result<()> {
        borrow_filter(&self.name, &self.target()?)?
            .filter(format, num_samples, inputs, offset_in, outputs, offset_out)
    }

    fn filter_in_place(
        &mut self,
        format: &AudioFormat,
        num_samples: usize,
        buffers: &mut [AudioBuffer],
        offset: usize,
    ) -> Result<()> {
        borrow_filter(&self.name, &self.target()?)?.filter_in_place(format, num_samples, buffers, offset)
    }
}
