//! voxcast - Long-form text to podcast audio
//!
//! Normalizes a document, cuts it into engine-sized chunks, synthesizes each
//! chunk through an external neural TTS engine and stitches the fragments
//! into one WAV file with short pauses between them.

// Enforce error handling discipline
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod audio;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod defaults;
pub mod error;
pub mod pipeline;
pub mod service;
pub mod text;
pub mod tts;

// Composition root for the binary
#[cfg(feature = "cli")]
pub mod app;

// Core seams (text → engine → audio)
pub use audio::{AudioAssembler, AudioFragment, Waveform};
pub use text::{Chunk, Segmenter, SentenceBoundary};
pub use tts::command::CommandEngine;
pub use tts::engine::{MockEngine, SpeechEngine, SynthesisParams};

// Pipeline
pub use pipeline::{Pipeline, PipelineConfig, PipelineOutput, SynthesisOrchestrator};

// Error handling
pub use error::{Result, VoxcastError};

// Config
pub use config::{Acceleration, Config};

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}
