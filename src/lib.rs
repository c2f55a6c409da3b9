pub mod config; // Sample rate, channels and seeding
pub mod dsp; // Filter design and numeric kernels
pub mod error;
pub mod graph; // Composable audio graph nodes
pub mod patch; // Building graphs from patch documents
pub mod synth; // Instruments, voices and pitch scales

pub use config::SynthConfig;
pub use error::{Result, SynthError};
