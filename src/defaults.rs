//! Default configuration constants for voxcast.
//!
//! Shared by the config layer, the CLI and the service boundary so the three
//! entry points agree on what an unconfigured run sounds like.

/// Sample rate of every fragment the engine returns, in Hz.
///
/// Kokoro emits 24kHz mono; the assembler and the WAV writer both assume it.
pub const SAMPLE_RATE: u32 = 24_000;

/// Character budget for a single synthesis chunk.
pub const MAX_CHARS: usize = 320;

/// Silence inserted between consecutive fragments, in milliseconds.
pub const SILENCE_MS: i64 = 320;

/// Longest accepted gap between fragments, in milliseconds.
pub const MAX_SILENCE_MS: i64 = 60_000;

/// Default voice identifier. The first character is the language code.
pub const VOICE: &str = "ef_dora";

/// Default speaking speed multiplier.
///
/// Slightly slower than 1.0 reads better for long-form narration.
pub const SPEED: f32 = 0.92;

/// Secondary split pattern handed to the engine for file-based runs.
pub const SPLIT_PATTERN: &str = r"\n{2,}";

/// Secondary split pattern used by the service boundary when the request
/// does not carry one.
pub const SERVICE_SPLIT_PATTERN: &str = r"\n+";

/// Default path of the input text file.
pub const TEXT_PATH: &str = "input/es_text.txt";

/// Default path of the rendered WAV file.
pub const OUTPUT_PATH: &str = "output/kokoro-es.wav";

/// Number of chunks synthesized in parallel. 1 keeps the run sequential.
pub const WORKERS: usize = 1;

/// Environment variable that enables the MPS fallback inside a PyTorch engine.
pub const MPS_FALLBACK_ENV: &str = "PYTORCH_ENABLE_MPS_FALLBACK";

/// Whether hardware acceleration is on when the config says `auto`.
///
/// Apple Silicon gets MPS; everything else stays on CPU.
pub fn acceleration_by_default() -> bool {
    cfg!(target_os = "macos")
}

/// Human-readable name of the acceleration backend for status lines.
pub fn acceleration_label(enabled: bool) -> &'static str {
    if enabled { "MPS" } else { "CPU" }
}
