//! Audio types, fragment assembly and WAV I/O.

pub mod assembler;
pub mod wav;

pub use assembler::AudioAssembler;

/// Samples the engine produced for (part of) one chunk.
///
/// Mono `f32` in `[-1.0, 1.0]` at the engine's sample rate.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AudioFragment {
    pub samples: Vec<f32>,
}

impl AudioFragment {
    pub fn new(samples: Vec<f32>) -> Self {
        Self { samples }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl From<Vec<f32>> for AudioFragment {
    fn from(samples: Vec<f32>) -> Self {
        Self::new(samples)
    }
}

/// The fully assembled signal of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl Waveform {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}
