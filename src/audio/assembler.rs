//! Joins engine fragments into one waveform with silence between them.

use crate::audio::{AudioFragment, Waveform};
use crate::defaults::MAX_SILENCE_MS;
use crate::error::{Result, VoxcastError};

/// Concatenates fragments, inserting a fixed gap strictly between neighbours.
///
/// Fragments are assumed to already be at `sample_rate`; nothing is resampled
/// or mixed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioAssembler {
    sample_rate: u32,
    silence_ms: i64,
}

impl AudioAssembler {
    /// `silence_ms <= 0` disables the gap.
    pub fn new(sample_rate: u32, silence_ms: i64) -> Self {
        Self {
            sample_rate,
            silence_ms,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Length of one silence buffer, rounded to the nearest sample.
    ///
    /// Gaps longer than [`MAX_SILENCE_MS`] are capped.
    pub fn silence_samples(&self) -> usize {
        if self.silence_ms <= 0 {
            return 0;
        }
        let ms = self.silence_ms.min(MAX_SILENCE_MS) as u64;
        let scaled = u64::from(self.sample_rate) * ms;
        ((scaled + 500) / 1000) as usize
    }

    /// Assemble `fragments` in order.
    ///
    /// Returns [`VoxcastError::NoAudio`] when there is nothing to join.
    pub fn assemble(&self, fragments: Vec<AudioFragment>) -> Result<Waveform> {
        if fragments.is_empty() {
            return Err(VoxcastError::NoAudio);
        }

        let gap = self.silence_samples();
        let total: usize = fragments.iter().map(AudioFragment::len).sum::<usize>()
            + gap * (fragments.len() - 1);

        let mut samples = Vec::with_capacity(total);
        for (idx, fragment) in fragments.into_iter().enumerate() {
            if idx > 0 && gap > 0 {
                samples.resize(samples.len() + gap, 0.0);
            }
            samples.extend(fragment.samples);
        }

        log::debug!(
            "Assembled {} samples ({} per gap) at {} Hz",
            samples.len(),
            gap,
            self.sample_rate
        );

        Ok(Waveform {
            samples,
            sample_rate: self.sample_rate,
        })
    }
}
