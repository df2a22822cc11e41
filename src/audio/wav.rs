//! WAV encoding of the final waveform and decoding of engine output.

use crate::audio::Waveform;
use crate::error::{Result, VoxcastError};
use std::fs;
use std::io::{Read, Seek, Write};
use std::path::Path;

/// PCM spec used for every file voxcast writes: mono, 16-bit integer.
pub fn output_spec(sample_rate: u32) -> hound::WavSpec {
    hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    }
}

/// Write `waveform` to `path` as 16-bit PCM, creating parent directories.
pub fn write_wav(path: &Path, waveform: &Waveform) -> Result<()> {
    let output_error = |message: String| VoxcastError::OutputWrite {
        path: path.display().to_string(),
        message,
    };

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| output_error(e.to_string()))?;
    }

    let mut writer = hound::WavWriter::create(path, output_spec(waveform.sample_rate))
        .map_err(|e| output_error(e.to_string()))?;
    for &sample in &waveform.samples {
        writer
            .write_sample(to_pcm16(sample))
            .map_err(|e| output_error(e.to_string()))?;
    }
    writer.finalize().map_err(|e| output_error(e.to_string()))
}

/// Encode `waveform` into any seekable writer (in-memory buffers, sockets
/// wrapped in a cursor).
pub fn encode_wav<W: Write + Seek>(writer: W, waveform: &Waveform) -> Result<()> {
    let output_error = |e: hound::Error| VoxcastError::OutputWrite {
        path: "<stream>".to_string(),
        message: e.to_string(),
    };

    let mut wav = hound::WavWriter::new(writer, output_spec(waveform.sample_rate))
        .map_err(output_error)?;
    for &sample in &waveform.samples {
        wav.write_sample(to_pcm16(sample)).map_err(output_error)?;
    }
    wav.finalize().map_err(output_error)
}

/// Decode a WAV stream into mono `f32` samples and its sample rate.
///
/// Integer PCM of any bit depth and 32-bit float are accepted. Multi-channel
/// audio is downmixed by averaging.
pub fn decode_wav<R: Read>(reader: R) -> Result<(Vec<f32>, u32)> {
    let mut wav_reader =
        hound::WavReader::new(reader).map_err(|e| VoxcastError::AudioFormatMismatch {
            expected: "WAV stream".to_string(),
            actual: format!("unparseable data ({})", e),
        })?;

    let spec = wav_reader.spec();
    let read_error = |e: hound::Error| VoxcastError::AudioFormatMismatch {
        expected: "readable WAV samples".to_string(),
        actual: e.to_string(),
    };

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => wav_reader
            .samples::<f32>()
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(read_error)?,
        hound::SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
            wav_reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(read_error)?
        }
    };

    let channels = spec.channels.max(1) as usize;
    let mono = if channels == 1 {
        interleaved
    } else {
        interleaved
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect()
    };

    Ok((mono, spec.sample_rate))
}

/// Convert a float sample to 16-bit PCM with clipping.
pub fn to_pcm16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16
}
