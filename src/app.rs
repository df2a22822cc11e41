//! File-based application entry point.
//!
//! read text file → pipeline → WAV file

use crate::audio::wav::write_wav;
use crate::config::{Acceleration, Config};
use crate::defaults;
use crate::error::{Result, VoxcastError};
use crate::pipeline::{Pipeline, PipelineConfig};
use crate::text::{Chunk, Segmenter, normalize};
use crate::tts::command::CommandEngine;
use crate::tts::engine::{MockEngine, SpeechEngine};
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};

/// Command-line overrides applied on top of the loaded configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SynthOverrides {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub voice: Option<String>,
    pub speed: Option<f32>,
    pub max_chars: Option<usize>,
    pub silence_ms: Option<i64>,
    pub split_pattern: Option<String>,
    pub workers: Option<usize>,
    pub acceleration: Option<Acceleration>,
    pub engine: Option<String>,
}

impl SynthOverrides {
    pub fn apply(self, config: &mut Config) {
        if let Some(input) = self.input {
            config.input.text_path = input;
        }
        if let Some(output) = self.output {
            config.input.output_path = output;
        }
        if let Some(voice) = self.voice {
            config.synthesis.voice = voice;
        }
        if let Some(speed) = self.speed {
            config.synthesis.speed = speed;
        }
        if let Some(max_chars) = self.max_chars {
            config.segmentation.max_chars = max_chars;
        }
        if let Some(silence_ms) = self.silence_ms {
            config.audio.silence_ms = silence_ms;
        }
        if let Some(pattern) = self.split_pattern {
            config.synthesis.split_pattern = pattern;
        }
        if let Some(workers) = self.workers {
            config.synthesis.workers = workers;
        }
        if let Some(acceleration) = self.acceleration {
            config.engine.acceleration = acceleration;
        }
        if let Some(engine) = self.engine {
            config.engine.command = Some(engine);
        }
    }
}

/// Run the synth command: read the input file, synthesize, write the WAV.
///
/// With `dry_run` the deterministic mock engine stands in for the external
/// one, which exercises everything except the engine process.
///
/// Returns the path of the written file.
pub async fn run_synth_command(
    mut config: Config,
    overrides: SynthOverrides,
    quiet: bool,
    dry_run: bool,
) -> Result<PathBuf> {
    overrides.apply(&mut config);
    config.validate()?;

    let engine = build_engine(&config, dry_run)?;
    synthesize_file(config, engine, quiet).await
}

/// Synthesize the configured input file with `engine` and write the WAV.
///
/// The text is normalized and segmented once; the same chunks are printed
/// and synthesized.
pub async fn synthesize_file(
    config: Config,
    engine: Box<dyn SpeechEngine>,
    quiet: bool,
) -> Result<PathBuf> {
    let input_path = config.input.text_path.clone();
    let output_path = config.input.output_path.clone();
    let text = read_input(&input_path)?;
    let source_name = input_path.display().to_string();

    let acceleration = config.engine.acceleration.enabled();
    if !quiet {
        eprintln!(
            "Engine: {} ({})",
            engine.name(),
            defaults::acceleration_label(acceleration)
        );
    }

    let pipeline = Pipeline::new(PipelineConfig::from(&config), engine)?;
    let chunks = pipeline.plan(&text, &source_name)?;
    if !quiet {
        eprintln!(
            "{} {} | {} {} | {} {}",
            "Chunks:".dimmed(),
            chunks.len(),
            "Voice:".dimmed(),
            config.synthesis.voice,
            "Speed:".dimmed(),
            config.synthesis.speed
        );
        eprintln!("{} {}", "Input:".dimmed(), input_path.display());
        eprintln!("Synthesizing...");
    }

    let output = pipeline.run_planned(chunks).await?;
    write_wav(&output_path, &output.waveform)?;

    if !quiet {
        eprintln!(
            "{} {} ({:.2}s)",
            "Audio saved to".green(),
            output_path.display(),
            output.waveform.duration_secs()
        );
    }

    Ok(output_path)
}

/// Run the chunks command: print the segmentation plan without synthesizing.
pub fn run_chunks_command(
    mut config: Config,
    input: Option<PathBuf>,
    max_chars: Option<usize>,
) -> Result<Vec<Chunk>> {
    if let Some(input) = input {
        config.input.text_path = input;
    }
    if let Some(max_chars) = max_chars {
        config.segmentation.max_chars = max_chars;
    }

    let text = read_input(&config.input.text_path)?;
    let normalized = normalize(&text, &config.input.text_path.display().to_string())?;
    let chunks = Segmenter::new(config.segmentation.max_chars)?.segment(&normalized);

    for chunk in &chunks {
        println!(
            "{} {}",
            format!("[{} | {} chars]", chunk.index, chunk.char_len()).dimmed(),
            chunk.text
        );
    }

    Ok(chunks)
}

/// Read a UTF-8 text file, mapping a missing file to [`VoxcastError::InputNotFound`].
pub fn read_input(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => VoxcastError::InputNotFound {
            path: path.display().to_string(),
        },
        _ => VoxcastError::Io(e),
    })
}

/// Build the engine named by the configuration.
pub fn build_engine(config: &Config, dry_run: bool) -> Result<Box<dyn SpeechEngine>> {
    if dry_run {
        return Ok(Box::new(MockEngine::new(config.audio.sample_rate)));
    }

    let program = config
        .engine
        .command
        .as_deref()
        .filter(|command| !command.trim().is_empty())
        .ok_or_else(|| VoxcastError::EngineUnavailable {
            message: "no engine command configured. Set [engine] command in the config, \
                      pass --engine, or use --dry-run"
                .to_string(),
        })?;

    let mut engine = CommandEngine::new(
        program,
        config.engine.args.clone(),
        config.audio.sample_rate,
    )
    .with_acceleration(config.engine.acceleration.enabled());
    for (key, value) in &config.engine.env {
        engine = engine.with_env(key, value);
    }

    Ok(Box::new(engine))
}
