use crate::graph::{
    amplify::Multiplication,
    mix::Addition,
    modifier::NoteModifier,
    node::{Filter, Generator},
    oscillator::Oscillator,
    stereo::Pan,
    through::Through,
};

/// Fluent construction for generator graphs.
///
/// ```
/// use patchsynth::graph::extensions::GeneratorExt;
/// use patchsynth::graph::filter::Scale;
/// use patchsynth::graph::oscillator::Linear;
///
/// let voice = Linear::new()
///     .sine()
///     .plus(Linear::new().detuned(3.0).sine())
///     .through(Scale::new(0.5))
///     .panned(0.8, 0.6);
/// ```
pub trait GeneratorExt: Generator + Sized {
    fn through<F: Filter>(self, filter: F) -> Through<Self, F> {
        Through::new(self, filter)
    }

    fn plus<G: Generator>(self, other: G) -> Addition<Self, G> {
        Addition::new(self, other)
    }

    fn times<G: Generator>(self, other: G) -> Multiplication<Self, G> {
        Multiplication::new(self, other)
    }

    fn panned(self, left: f64, right: f64) -> Pan<Self> {
        Pan::new(self, left, right)
    }

    /// Treat this generator's output as phase for a sine.
    fn sine(self) -> Oscillator<Self> {
        Oscillator::sine(self)
    }

    fn saw(self) -> Oscillator<Self> {
        Oscillator::saw(self)
    }

    /// Shift the note this generator sees by `hz`.
    fn detuned(self, hz: f64) -> NoteModifier<Self> {
        NoteModifier::detuned(self, hz)
    }

    fn boxed(self) -> Box<dyn Generator>
    where
        Self: 'static,
    {
        Box::new(self)
    }
}

impl<T: Generator> GeneratorExt for T {}
