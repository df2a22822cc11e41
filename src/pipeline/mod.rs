//! Text-to-waveform pipeline.
//!
//! normalize → segment → synthesize each chunk → assemble. Every stage is a
//! pure function of its input plus the explicit [`PipelineConfig`]; nothing is
//! read from the environment here.

pub mod orchestrator;

pub use orchestrator::SynthesisOrchestrator;

use crate::audio::{AudioAssembler, AudioFragment, Waveform};
use crate::config::Config;
use crate::defaults;
use crate::error::{Result, VoxcastError};
use crate::text::{Chunk, Segmenter, SentenceBoundary, normalize};
use crate::tts::engine::{SpeechEngine, SynthesisParams};
use std::sync::Arc;

/// Configuration for the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Character budget per chunk
    pub max_chars: usize,
    /// Sample rate shared by the engine, the assembler and the output file
    pub sample_rate: u32,
    /// Gap between fragments; `<= 0` disables it
    pub silence_ms: i64,
    /// Voice, speed and engine split pattern
    pub params: SynthesisParams,
    /// Engine calls in flight; 1 keeps synthesis sequential
    pub workers: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_chars: defaults::MAX_CHARS,
            sample_rate: defaults::SAMPLE_RATE,
            silence_ms: defaults::SILENCE_MS,
            params: SynthesisParams::default(),
            workers: defaults::WORKERS,
        }
    }
}

impl From<&Config> for PipelineConfig {
    fn from(config: &Config) -> Self {
        Self {
            max_chars: config.segmentation.max_chars,
            sample_rate: config.audio.sample_rate,
            silence_ms: config.audio.silence_ms,
            params: SynthesisParams {
                voice: config.synthesis.voice.clone(),
                speed: config.synthesis.speed,
                split_pattern: config.synthesis.split_pattern.clone(),
            },
            workers: config.synthesis.workers,
        }
    }
}

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    pub waveform: Waveform,
    /// Chunks sent to the engine
    pub chunk_count: usize,
    /// Fragments the engine returned across all chunks
    pub fragment_count: usize,
}

/// The full text-to-audio pipeline around one engine.
pub struct Pipeline<E: SpeechEngine> {
    segmenter: Segmenter,
    orchestrator: SynthesisOrchestrator<E>,
    assembler: AudioAssembler,
    workers: usize,
}

impl<E: SpeechEngine + 'static> Pipeline<E> {
    /// Build a pipeline.
    ///
    /// Fails if the budget is zero or the engine's sample rate differs from
    /// `config.sample_rate`: the assembler never resamples.
    pub fn new(config: PipelineConfig, engine: E) -> Result<Self> {
        Self::from_arc(config, Arc::new(engine))
    }

    pub fn from_arc(config: PipelineConfig, engine: Arc<E>) -> Result<Self> {
        if engine.sample_rate() != config.sample_rate {
            return Err(VoxcastError::AudioFormatMismatch {
                expected: format!("{} Hz", config.sample_rate),
                actual: format!("{} Hz from engine {}", engine.sample_rate(), engine.name()),
            });
        }

        Ok(Self {
            segmenter: Segmenter::new(config.max_chars)?,
            orchestrator: SynthesisOrchestrator::from_arc(engine, config.params),
            assembler: AudioAssembler::new(config.sample_rate, config.silence_ms),
            workers: config.workers.max(1),
        })
    }

    /// Use another sentence boundary strategy for over-budget paragraphs.
    pub fn with_boundary(mut self, boundary: impl SentenceBoundary + 'static) -> Self {
        self.segmenter = self.segmenter.with_boundary(boundary);
        self
    }

    pub fn orchestrator(&self) -> &SynthesisOrchestrator<E> {
        &self.orchestrator
    }

    /// Normalize and segment without synthesizing.
    ///
    /// `source_name` only labels the [`VoxcastError::EmptyInput`] error.
    pub fn plan(&self, text: &str, source_name: &str) -> Result<Vec<Chunk>> {
        let normalized = normalize(text, source_name)?;
        Ok(self.segmenter.segment(&normalized))
    }

    /// Run the whole pipeline sequentially on the current thread.
    pub fn run_blocking(&self, text: &str, source_name: &str) -> Result<PipelineOutput> {
        let chunks = self.plan(text, source_name)?;
        self.log_plan(&chunks);
        let fragments = self.orchestrator.synthesize(&chunks)?;
        self.finish(chunks.len(), fragments)
    }

    /// Run the whole pipeline, synthesizing concurrently when `workers > 1`.
    ///
    /// Sequential runs are moved to the blocking pool so the caller's runtime
    /// is never stalled by the engine.
    pub async fn run(&self, text: &str, source_name: &str) -> Result<PipelineOutput> {
        let chunks = self.plan(text, source_name)?;
        self.run_planned(chunks).await
    }

    /// Synthesize and assemble chunks from an earlier [`Pipeline::plan`].
    pub async fn run_planned(&self, chunks: Vec<Chunk>) -> Result<PipelineOutput> {
        self.log_plan(&chunks);

        let chunk_count = chunks.len();
        let fragments = if self.workers > 1 {
            self.orchestrator
                .synthesize_concurrent(&chunks, self.workers)
                .await?
        } else {
            let orchestrator = self.orchestrator.clone();
            tokio::task::spawn_blocking(move || orchestrator.synthesize(&chunks))
                .await
                .map_err(|e| VoxcastError::Other(format!("Synthesis task panicked: {}", e)))??
        };

        self.finish(chunk_count, fragments)
    }

    fn log_plan(&self, chunks: &[Chunk]) {
        let params = self.orchestrator.params();
        log::info!(
            "Chunks to synthesize: {} | Voice: {} | Speed: {} | Workers: {}",
            chunks.len(),
            params.voice,
            params.speed,
            self.workers
        );
    }

    fn finish(&self, chunk_count: usize, fragments: Vec<AudioFragment>) -> Result<PipelineOutput> {
        let fragment_count = fragments.len();
        let waveform = self.assembler.assemble(fragments)?;
        log::info!(
            "Assembled {} fragments into {:.2}s of audio",
            fragment_count,
            waveform.duration_secs()
        );
        Ok(PipelineOutput {
            waveform,
            chunk_count,
            fragment_count,
        })
    }
}
