//! Command-line interface for voxcast
//!
//! Provides argument parsing using clap derive macros.

use crate::config::Acceleration;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Turn long-form text into a narrated WAV file
#[derive(Parser, Debug)]
#[command(
    name = "voxcast",
    version,
    about = "Turn long-form text into a narrated WAV file"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress output (quiet mode)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose output (-v: per-run diagnostics, -vv: per-chunk diagnostics)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Parse a silence duration into milliseconds.
///
/// Bare numbers are milliseconds; anything else goes through `humantime`
/// (`320ms`, `1s`, `1s 500ms`).
fn parse_silence_ms(s: &str) -> Result<i64, String> {
    let s = s.trim();
    if let Ok(ms) = s.parse::<i64>() {
        return Ok(ms);
    }
    humantime::parse_duration(s)
        .map_err(|e| e.to_string())
        .and_then(|d| i64::try_from(d.as_millis()).map_err(|e| e.to_string()))
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Synthesize a text file into a WAV file
    Synth {
        /// Text file to read (default: [input] text_path)
        #[arg(value_name = "INPUT")]
        input: Option<PathBuf>,

        /// WAV file to write (default: [input] output_path)
        #[arg(short, long, value_name = "OUTPUT")]
        output: Option<PathBuf>,

        /// Voice id (e.g., ef_dora, em_alex, af_heart)
        #[arg(long, value_name = "VOICE")]
        voice: Option<String>,

        /// Speaking speed multiplier
        #[arg(long, value_name = "SPEED")]
        speed: Option<f32>,

        /// Character budget per chunk
        #[arg(long, value_name = "CHARS")]
        max_chars: Option<usize>,

        /// Silence between fragments. Examples: 320ms, 1s, 0
        #[arg(long, value_name = "DURATION", value_parser = parse_silence_ms)]
        silence: Option<i64>,

        /// Regex the engine uses to re-split each chunk
        #[arg(long, value_name = "REGEX")]
        split_pattern: Option<String>,

        /// Chunks synthesized in parallel
        #[arg(long, short = 'j', value_name = "N")]
        workers: Option<usize>,

        /// Hardware acceleration for the engine (auto, on, off)
        #[arg(long, value_name = "MODE")]
        acceleration: Option<Acceleration>,

        /// Engine program (overrides [engine] command)
        #[arg(long, value_name = "CMD")]
        engine: Option<String>,

        /// Use the built-in mock engine instead of running one
        #[arg(long)]
        dry_run: bool,
    },

    /// Print how a text file would be chunked
    Chunks {
        /// Text file to read (default: [input] text_path)
        #[arg(value_name = "INPUT")]
        input: Option<PathBuf>,

        /// Character budget per chunk
        #[arg(long, value_name = "CHARS")]
        max_chars: Option<usize>,
    },

    /// List known voices
    Voices,

    /// View configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

/// Configuration actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the configuration file path
    Path,
    /// Show the effective configuration (file + environment)
    Show,
    /// Dump a commented configuration template
    Dump,
}
