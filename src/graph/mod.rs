//! Composable building blocks for constructing audio-processing graphs.
//!
//! A graph is made of three kinds of node: generators render a note,
//! filters transform buffers, envelopes shape a note's gain over time. The
//! `extensions` module adds fluent helpers so graphs can be assembled in
//! code as well as through the patch builder.

/// Multiply two generators (amplitude or ring modulation).
pub mod amplify;
/// Weighted bank of LFO delays.
pub mod chorus;
/// Sinusoidally modulated fractional delay line.
pub mod delay;
/// ADSR and unity envelopes.
pub mod envelope;
/// Fluent combinators (`.through()`, `.plus()`, etc.).
pub mod extensions;
/// Chain, parallel sum and gain filters.
pub mod filter;
/// Sum two generators.
pub mod mix;
/// Pitch and volume rewrites on the way to a child.
pub mod modifier;
/// Core traits shared by all graph nodes.
pub mod node;
/// White noise.
pub mod noise;
/// Peak normalisation of rendered buffers.
pub mod normalize;
/// Phase sources and waveform shapers.
pub mod oscillator;
/// Karplus-Strong plucked string.
pub mod pluck;
/// Named nodes and forward references.
pub mod reference;
/// Ears, Pan and ApplyPan.
pub mod stereo;
/// Detuned sawtooth stack.
pub mod supersaw;
/// Serial chaining of a generator into a filter.
pub mod through;
