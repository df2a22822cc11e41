//! Speech engine trait, per-run synthesis parameters and a deterministic mock.

use crate::audio::AudioFragment;
use crate::defaults;
use crate::error::{Result, VoxcastError};
use regex::Regex;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Per-run parameters forwarded to the engine with every chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisParams {
    /// Voice identifier, e.g. `ef_dora`. The first character is the language code.
    pub voice: String,
    /// Speaking speed multiplier (> 0).
    pub speed: f32,
    /// Regex the engine uses for its own re-splitting of a chunk.
    pub split_pattern: String,
}

impl Default for SynthesisParams {
    fn default() -> Self {
        Self {
            voice: defaults::VOICE.to_string(),
            speed: defaults::SPEED,
            split_pattern: defaults::SPLIT_PATTERN.to_string(),
        }
    }
}

/// Trait for text-to-speech synthesis.
///
/// This trait allows swapping implementations (external engine vs mock).
pub trait SpeechEngine: Send + Sync {
    /// Synthesize one chunk of text.
    ///
    /// # Returns
    /// Zero or more fragments at [`SpeechEngine::sample_rate`]. An empty list
    /// is a valid answer that the orchestrator treats as a failed chunk.
    fn synthesize(&self, text: &str, params: &SynthesisParams) -> Result<Vec<AudioFragment>>;

    /// Engine name for status output
    fn name(&self) -> &str;

    /// Sample rate of every returned fragment
    fn sample_rate(&self) -> u32;
}

/// Implement SpeechEngine for Arc<T> to allow sharing across worker tasks.
impl<T: SpeechEngine + ?Sized> SpeechEngine for Arc<T> {
    fn synthesize(&self, text: &str, params: &SynthesisParams) -> Result<Vec<AudioFragment>> {
        (**self).synthesize(text, params)
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn sample_rate(&self) -> u32 {
        (**self).sample_rate()
    }
}

impl<T: SpeechEngine + ?Sized> SpeechEngine for Box<T> {
    fn synthesize(&self, text: &str, params: &SynthesisParams) -> Result<Vec<AudioFragment>> {
        (**self).synthesize(text, params)
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn sample_rate(&self) -> u32 {
        (**self).sample_rate()
    }
}

/// Deterministic engine for tests and dry runs.
///
/// Splits each chunk with the request's split pattern and returns one fragment
/// per non-blank piece, `samples_per_char` samples per character.
#[derive(Debug, Clone)]
pub struct MockEngine {
    sample_rate: u32,
    samples_per_char: usize,
    silent_marker: Option<String>,
    failing_marker: Option<String>,
    delay: Option<Duration>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockEngine {
    /// Create a new mock engine with default settings
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            samples_per_char: 10,
            silent_marker: None,
            failing_marker: None,
            delay: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Fragment length per input character
    pub fn with_samples_per_char(mut self, n: usize) -> Self {
        self.samples_per_char = n;
        self
    }

    /// Return no fragments for chunks containing `marker`
    pub fn with_silence_on(mut self, marker: &str) -> Self {
        self.silent_marker = Some(marker.to_string());
        self
    }

    /// Return an error for chunks containing `marker`
    pub fn with_failure_on(mut self, marker: &str) -> Self {
        self.failing_marker = Some(marker.to_string());
        self
    }

    /// Sleep before answering; shorter chunks answer sooner
    pub fn with_delay_per_char(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Texts received so far, in call order
    pub fn calls(&self) -> Vec<String> {
        match self.calls.lock() {
            Ok(calls) => calls.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn record(&self, text: &str) {
        let mut calls = match self.calls.lock() {
            Ok(calls) => calls,
            Err(poisoned) => poisoned.into_inner(),
        };
        calls.push(text.to_string());
    }
}

impl SpeechEngine for MockEngine {
    fn synthesize(&self, text: &str, params: &SynthesisParams) -> Result<Vec<AudioFragment>> {
        self.record(text);

        if let Some(delay) = self.delay {
            std::thread::sleep(delay * text.chars().count() as u32);
        }

        if let Some(marker) = &self.failing_marker
            && text.contains(marker.as_str())
        {
            return Err(VoxcastError::Other("mock synthesis failure".to_string()));
        }
        if let Some(marker) = &self.silent_marker
            && text.contains(marker.as_str())
        {
            return Ok(Vec::new());
        }

        let splitter = Regex::new(&params.split_pattern).map_err(|e| {
            VoxcastError::ConfigInvalidValue {
                key: "synthesis.split_pattern".to_string(),
                message: e.to_string(),
            }
        })?;

        Ok(splitter
            .split(text)
            .map(str::trim)
            .filter(|piece| !piece.is_empty())
            .map(|piece| {
                AudioFragment::new(vec![0.1; piece.chars().count() * self.samples_per_char])
            })
            .collect())
    }

    fn name(&self) -> &str {
        "mock"
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}
