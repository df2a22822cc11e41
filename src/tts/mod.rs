//! Speech engine seam: the trait, a command-backed engine, a mock, voices.

pub mod command;
pub mod engine;
pub mod voices;

pub use command::{CommandEngine, ProcessRunner, ProcessSpec, SystemProcessRunner};
pub use engine::{MockEngine, SpeechEngine, SynthesisParams};
