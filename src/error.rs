//! Error type shared by graph construction and rendering.
//!
//! Every variant is a configuration problem: nothing here is retried, and a
//! render call that hits one is abandoned.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SynthError {
    #[error("unknown component type \"{0}\"")]
    UnknownComponent(String),

    #[error("component \"{component}\" is missing required field \"{field}\"")]
    MissingField {
        component: String,
        field: &'static str,
    },

    #[error("component \"{component}\" has an invalid \"{field}\": {reason}")]
    InvalidField {
        component: String,
        field: &'static str,
        reason: String,
    },

    #[error("component \"{component}\" may not set both \"{first}\" and \"{second}\"")]
    ConflictingFields {
        component: String,
        first: &'static str,
        second: &'static str,
    },

    #[error("no component is registered under the name \"{0}\"")]
    UnresolvedReference(String),

    #[error("\"{name}\" is a {found}, expected a {expected}")]
    WrongKind {
        name: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("copy of \"{0}\" was used before references were resolved")]
    UnboundReference(String),

    #[error("\"{0}\" was re-entered while it was already rendering")]
    ReentrantReference(String),

    #[error("expected {expected} channels but got {found}")]
    ChannelMismatch { expected: usize, found: usize },

    #[error("{0} requires a stereo format")]
    StereoRequired(&'static str),

    #[error("buffer of {found} samples cannot hold {needed} samples")]
    BufferTooShort { needed: usize, found: usize },

    #[error("biquad needs matching pole and zero counts (got {poles} poles, {zeros} zeros)")]
    PoleZeroCount { poles: usize, zeros: usize },

    #[error("{0} must be both real or a conjugate pair")]
    NonConjugatePair(&'static str),

    #[error("FFT length {0} is not a power of two")]
    NotPowerOfTwo(usize),

    #[error("invalid note: {0}")]
    InvalidNote(String),

    #[error("pitch scale has no notes")]
    EmptyScale,

    #[error("invalid curve expression: {0}")]
    InvalidExpression(String),

    #[error("malformed patch document: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type Result<T, E = SynthError> = std::result::Result<T, E>;
