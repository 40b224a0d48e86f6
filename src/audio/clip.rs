//! Whole-clip mono audio for offline rendering.

use std::path::Path;

use log::info;

use super::synthesis::render_composition;
use crate::error::{FieldError, FieldResult};

/// Mono sample buffer with its sample rate
#[derive(Debug, Clone)]
pub struct AudioClip {
    samples: Vec<f32>,
    sample_rate_hz: usize,
}

impl AudioClip {
    pub fn from_samples(samples: Vec<f32>, sample_rate_hz: usize) -> Self {
        Self {
            samples,
            sample_rate_hz,
        }
    }

    /// Load a WAV file, averaging channels down to mono
    pub fn load_wav(path: impl AsRef<Path>) -> FieldResult<Self> {
        let path = path.as_ref();
        let mut reader = hound::WavReader::open(path)?;
        let spec = reader.spec();
        let channels = spec.channels.max(1) as usize;

        let interleaved: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<Vec<f32>, _>>()?,
            hound::SampleFormat::Int => {
                let scale = 1.0 / (1u64 << (spec.bits_per_sample.max(1) - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 * scale))
                    .collect::<Result<Vec<f32>, _>>()?
            }
        };

        let samples: Vec<f32> = interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
            .collect();

        info!(
            "Loaded {}: {} channel(s) @ {}Hz, {:.2}s",
            path.display(),
            channels,
            spec.sample_rate,
            samples.len() as f32 / spec.sample_rate as f32
        );
        Ok(Self::from_samples(samples, spec.sample_rate as usize))
    }

    /// Render a Glicol composition
    pub fn synthesize(code: &str, duration_s: f32, sample_rate_hz: usize) -> FieldResult<Self> {
        let samples = render_composition(code, duration_s, sample_rate_hz)?;
        Ok(Self::from_samples(samples, sample_rate_hz))
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate_hz(&self) -> usize {
        self.sample_rate_hz
    }

    pub fn duration_s(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate_hz.max(1) as f32
    }

    /// Index of the sample at `time_s`, clamped to the clip
    fn sample_at(&self, time_s: f32) -> usize {
        let index = (time_s.max(0.0) * self.sample_rate_hz as f32).round() as usize;
        index.min(self.samples.len())
    }

    /// The `size` samples ending at `time_s`, zero-padded before the clip start
    pub fn window_ending_at(&self, time_s: f32, size: usize) -> Vec<f32> {
        let end = self.sample_at(time_s);
        let start = end.saturating_sub(size);
        let mut window = vec![0.0; size - (end - start)];
        window.extend_from_slice(&self.samples[start..end]);
        window
    }

    /// Samples in `[from_s, to_s)`
    pub fn segment(&self, from_s: f32, to_s: f32) -> &[f32] {
        let start = self.sample_at(from_s);
        let end = self.sample_at(to_s).max(start);
        &self.samples[start..end]
    }
}

/// Load `path` when given, else synthesize the default composition
pub fn load_or_synthesize(
    path: Option<&Path>,
    duration_s: f32,
    sample_rate_hz: usize,
) -> FieldResult<AudioClip> {
    match path {
        Some(path) if !path.exists() => Err(FieldError::audio(format!(
            "input file {} does not exist",
            path.display()
        ))),
        Some(path) => AudioClip::load_wav(path),
        None => AudioClip::synthesize(super::GLICOL_COMPOSITION, duration_s, sample_rate_hz),
    }
}
