//! WAV decoding and encoding.
//!
//! Everything inside the pipeline is mono `f32` in `[-1, 1]`; conversion
//! happens only here, at the file boundary.

use crate::error::{PodcastError, Result};
use std::io::{Cursor, Read};
use std::path::Path;

/// Decoded mono audio.
#[derive(Debug, Clone, PartialEq)]
pub struct MonoAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl MonoAudio {
    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Decode WAV data from any reader, down-mixing to mono.
///
/// Supports integer PCM (8 to 32 bit) and 32-bit float.
pub fn from_reader<R: Read>(reader: R) -> Result<MonoAudio> {
    let mut wav_reader = hound::WavReader::new(reader).map_err(|e| PodcastError::AudioFile {
        message: format!("Failed to parse WAV data: {}", e),
    })?;

    let spec = wav_reader.spec();
    if spec.channels == 0 {
        return Err(PodcastError::AudioFile {
            message: "WAV data declares zero channels".to_string(),
        });
    }

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => wav_reader
            .samples::<f32>()
            .collect::<std::result::Result<Vec<_>, _>>(),
        hound::SampleFormat::Int => {
            let scale = 1.0 / (1u64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
            wav_reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<std::result::Result<Vec<_>, _>>()
        }
    }
    .map_err(|e| PodcastError::AudioFile {
        message: format!("Failed to read WAV samples: {}", e),
    })?;

    Ok(MonoAudio {
        samples: downmix(&interleaved, spec.channels),
        sample_rate: spec.sample_rate,
    })
}

/// Decode an in-memory WAV file.
pub fn from_bytes(bytes: &[u8]) -> Result<MonoAudio> {
    from_reader(Cursor::new(bytes))
}

/// Read a WAV file from disk.
pub fn read_file(path: &Path) -> Result<MonoAudio> {
    let file = std::fs::File::open(path).map_err(|e| PodcastError::AudioFile {
        message: format!("Failed to open {}: {}", path.display(), e),
    })?;
    from_reader(std::io::BufReader::new(file))
}

/// Write mono samples as 16-bit PCM, clamping to `[-1, 1]`.
pub fn write_file(path: &Path, samples: &[f32], sample_rate: u32) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let map_err = |e: hound::Error| PodcastError::AudioFile {
        message: format!("Failed to write {}: {}", path.display(), e),
    };
    let mut writer = hound::WavWriter::create(path, spec).map_err(map_err)?;
    for &sample in samples {
        writer.write_sample(to_i16(sample)).map_err(map_err)?;
    }
    writer.finalize().map_err(map_err)?;
    Ok(())
}

fn to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16
}

/// Average interleaved channels into one.
pub fn downmix(interleaved: &[f32], channels: u16) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    let channels = channels as usize;
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

/// Simple linear interpolation resampling.
pub fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || samples.is_empty() || from_rate == 0 || to_rate == 0 {
        return samples.to_vec();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let output_len = (samples.len() as f64 / ratio).round() as usize;

    (0..output_len)
        .map(|i| {
            let source_pos = i as f64 * ratio;
            let source_idx = source_pos.floor() as usize;
            let fraction = (source_pos - source_idx as f64) as f32;

            if source_idx + 1 >= samples.len() {
                samples[samples.len() - 1]
            } else {
                let left = samples[source_idx];
                let right = samples[source_idx + 1];
                left + (right - left) * fraction
            }
        })
        .collect()
}

/// `duration_ms` of silence at `sample_rate`.
pub fn silence(duration_ms: u32, sample_rate: u32) -> Vec<f32> {
    vec![0.0; samples_for_ms(duration_ms, sample_rate)]
}

pub fn samples_for_ms(duration_ms: u32, sample_rate: u32) -> usize {
    (duration_ms as u64 * sample_rate as u64 / 1000) as usize
}
