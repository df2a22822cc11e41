//! Configuration file loading, environment overrides and validation.

use crate::defaults;
use crate::error::{Result, VoxcastError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub input: InputConfig,
    pub segmentation: SegmentationConfig,
    pub synthesis: SynthesisConfig,
    pub audio: AudioConfig,
    pub engine: EngineConfig,
}

/// File locations for the file-based entry point
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InputConfig {
    pub text_path: PathBuf,
    pub output_path: PathBuf,
}

/// Chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SegmentationConfig {
    pub max_chars: usize,
}

/// Parameters forwarded to the speech engine
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SynthesisConfig {
    pub voice: String,
    pub speed: f32,
    pub split_pattern: String,
    pub workers: usize,
}

/// Output audio configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioConfig {
    pub sample_rate: u32,
    pub silence_ms: i64,
}

/// External engine process configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Program to run per chunk; `None` means no engine is configured
    pub command: Option<String>,
    pub args: Vec<String>,
    pub acceleration: Acceleration,
    /// Extra environment for the engine process
    pub env: BTreeMap<String, String>,
}

/// Hardware acceleration toggle for the engine
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Acceleration {
    /// On for macOS, off elsewhere
    #[default]
    Auto,
    On,
    Off,
}

impl Acceleration {
    pub fn enabled(self) -> bool {
        match self {
            Acceleration::Auto => defaults::acceleration_by_default(),
            Acceleration::On => true,
            Acceleration::Off => false,
        }
    }
}

impl std::str::FromStr for Acceleration {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Acceleration::Auto),
            "on" | "yes" | "y" | "si" | "s" | "true" | "1" => Ok(Acceleration::On),
            "off" | "no" | "n" | "false" | "0" | "cpu" => Ok(Acceleration::Off),
            other => Err(format!("unknown acceleration mode '{}' (auto, on, off)", other)),
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            text_path: PathBuf::from(defaults::TEXT_PATH),
            output_path: PathBuf::from(defaults::OUTPUT_PATH),
        }
    }
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            max_chars: defaults::MAX_CHARS,
        }
    }
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            voice: defaults::VOICE.to_string(),
            speed: defaults::SPEED,
            split_pattern: defaults::SPLIT_PATTERN.to_string(),
            workers: defaults::WORKERS,
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: defaults::SAMPLE_RATE,
            silence_ms: defaults::SILENCE_MS,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            command: None,
            args: [
                "--voice",
                "{voice}",
                "--speed",
                "{speed}",
                "--split-pattern",
                "{split_pattern}",
                "--lang",
                "{lang}",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            acceleration: Acceleration::Auto,
            env: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Only returns defaults if the file is missing.
    /// Returns errors for invalid TOML.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(e)
                if e.downcast_ref::<std::io::Error>()
                    .is_some_and(|io_err| io_err.kind() == std::io::ErrorKind::NotFound) =>
            {
                Ok(Self::default())
            }
            Err(e) => Err(e.context(format!("Failed to load config from {}", path.display()))),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - VOXCAST_VOICE → synthesis.voice
    /// - VOXCAST_ENGINE → engine.command
    /// - VOXCAST_ACCELERATION → engine.acceleration (auto, on, off)
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(voice) = std::env::var("VOXCAST_VOICE")
            && !voice.is_empty()
        {
            self.synthesis.voice = voice;
        }

        if let Ok(command) = std::env::var("VOXCAST_ENGINE")
            && !command.is_empty()
        {
            self.engine.command = Some(command);
        }

        if let Ok(mode) = std::env::var("VOXCAST_ACCELERATION")
            && let Ok(acceleration) = mode.parse::<Acceleration>()
        {
            self.engine.acceleration = acceleration;
        }

        self
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        let invalid = |key: &str, message: &str| {
            Err(VoxcastError::ConfigInvalidValue {
                key: key.to_string(),
                message: message.to_string(),
            })
        };

        if self.segmentation.max_chars == 0 {
            return invalid("segmentation.max_chars", "must be positive");
        }
        if !(self.synthesis.speed.is_finite() && self.synthesis.speed > 0.0) {
            return invalid("synthesis.speed", "must be a positive number");
        }
        if self.synthesis.workers == 0 {
            return invalid("synthesis.workers", "must be at least 1");
        }
        if self.synthesis.voice.is_empty() {
            return invalid("synthesis.voice", "must not be empty");
        }
        if let Err(e) = regex::Regex::new(&self.synthesis.split_pattern) {
            return invalid("synthesis.split_pattern", &e.to_string());
        }
        if self.audio.sample_rate == 0 {
            return invalid("audio.sample_rate", "must be positive");
        }
        if self.audio.silence_ms > defaults::MAX_SILENCE_MS {
            return invalid(
                "audio.silence_ms",
                &format!("must be at most {}", defaults::MAX_SILENCE_MS),
            );
        }
        Ok(())
    }

    /// Serialize to TOML (for `voxcast config show`).
    pub fn to_toml(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/voxcast/config.toml on Linux
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("voxcast")
            .join("config.toml")
    }
}

/// Commented configuration template for `voxcast config dump`.
pub fn config_template() -> String {
    format!(
        r#"# voxcast configuration

[input]
# Text file read by `voxcast synth` when no INPUT is given
text_path = "{text_path}"
# WAV file written by `voxcast synth` when no --output is given
output_path = "{output_path}"

[segmentation]
# Character budget per synthesis chunk
max_chars = {max_chars}

[synthesis]
# Voice id; the first letter is the language (e = Spanish, a = US, b = UK)
voice = "{voice}"
speed = {speed}
# Regex the engine uses to re-split a chunk internally
split_pattern = '{split_pattern}'
# Chunks synthesized in parallel (1 = sequential)
workers = {workers}

[audio]
sample_rate = {sample_rate}
# Silence between fragments; 0 disables it
silence_ms = {silence_ms}

[engine]
# Program that reads text on stdin and writes WAV on stdout
# command = "kokoro-tts"
args = ["--voice", "{{voice}}", "--speed", "{{speed}}", "--split-pattern", "{{split_pattern}}", "--lang", "{{lang}}"]
# auto = on for macOS (MPS), off elsewhere
acceleration = "auto"

[engine.env]
"#,
        text_path = defaults::TEXT_PATH,
        output_path = defaults::OUTPUT_PATH,
        max_chars = defaults::MAX_CHARS,
        voice = defaults::VOICE,
        speed = defaults::SPEED,
        split_pattern = defaults::SPLIT_PATTERN,
        workers = defaults::WORKERS,
        sample_rate = defaults::SAMPLE_RATE,
        silence_ms = defaults::SILENCE_MS,
    )
}
