// Purpose: turning timed notes into audio
// This layer sits above graph nodes: instruments apply envelopes, voices
// decide which notes an instrument plays in each measure.

pub mod instrument;
pub mod scale;
pub mod voice;

pub use instrument::Instrument;
pub use scale::{PitchScale, UniformScale};
pub use voice::{NoteType, Voice};
