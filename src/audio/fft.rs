//! FFT spectrum analysis producing per-frame spectral bins.

use std::f32::consts::PI;
use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

use super::AudioBands;
use crate::engine::SpectralAnalyzer;
use crate::error::FieldResult;
use crate::params::AnalysisConfig;

/// Windowed FFT over the newest `fft_size` samples of each buffer
pub struct FftAnalyzer {
    config: AnalysisConfig,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    buffer: Vec<Complex<f32>>,
    /// Normalized magnitudes of bins `0..=fft_size / 2`
    magnitudes: Vec<f32>,
}

impl FftAnalyzer {
    pub fn new(config: AnalysisConfig) -> FieldResult<Self> {
        config.validate()?;

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(config.fft_size);
        let window = (0..config.fft_size)
            .map(|i| hann_window(i, config.fft_size))
            .collect();

        Ok(Self {
            fft,
            window,
            buffer: vec![Complex::new(0.0, 0.0); config.fft_size],
            magnitudes: vec![0.0; config.fft_size / 2 + 1],
            config,
        })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Transform the newest `fft_size` samples; shorter buffers are zero-padded at the front
    pub fn analyze(&mut self, audio: &[f32]) -> &[f32] {
        let size = self.config.fft_size;
        let tail = &audio[audio.len().saturating_sub(size)..];
        let pad = size - tail.len();

        for (i, slot) in self.buffer.iter_mut().enumerate() {
            let sample = if i < pad { 0.0 } else { tail[i - pad] };
            let sample = if sample.is_finite() { sample } else { 0.0 };
            *slot = Complex::new(sample * self.window[i], 0.0);
        }
        self.fft.process(&mut self.buffer);

        let scale = 2.0 / size as f32;
        for (magnitude, c) in self.magnitudes.iter_mut().zip(&self.buffer) {
            *magnitude = c.norm() * scale;
        }
        &self.magnitudes
    }

    /// Magnitudes from the last [`analyze`](Self::analyze)
    pub fn magnitudes(&self) -> &[f32] {
        &self.magnitudes
    }

    fn mean_magnitude(&self, bins: std::ops::Range<usize>) -> f32 {
        let bins = bins.start.min(self.magnitudes.len() - 1)..bins.end.min(self.magnitudes.len());
        if bins.is_empty() {
            return 0.0;
        }
        self.magnitudes[bins.clone()].iter().sum::<f32>() / bins.len() as f32
    }

    /// Mean bass/mid/high magnitudes of the last analysis
    pub fn bands(&self) -> AudioBands {
        AudioBands {
            low: self.mean_magnitude(self.config.bass_bins()),
            mid: self.mean_magnitude(self.config.mid_bins()),
            high: self.mean_magnitude(self.config.high_bins()),
        }
    }

    /// Split `[low_hz, high_hz]` into `num_bins` equal-width bands of the last analysis.
    ///
    /// Each band averages the FFT bins whose center frequency falls inside it;
    /// bands narrower than one FFT bin read the nearest bin.
    pub fn band_frame(&self, low_hz: f32, high_hz: f32, num_bins: usize) -> Vec<f32> {
        let bin_hz = self.config.bin_width_hz();
        let nyquist = self.config.fft_size / 2;
        let band_hz = (high_hz - low_hz).max(0.0) / num_bins.max(1) as f32;

        (0..num_bins)
            .map(|band| {
                let lo = low_hz + band_hz * band as f32;
                let hi = lo + band_hz;
                let start = ((lo / bin_hz).ceil().max(0.0) as usize).min(nyquist);
                let end = ((hi / bin_hz).ceil().max(0.0) as usize).min(nyquist + 1);
                if end > start {
                    self.mean_magnitude(start..end)
                } else {
                    let nearest = ((0.5 * (lo + hi) / bin_hz).round().max(0.0) as usize).min(nyquist);
                    self.magnitudes[nearest]
                }
            })
            .collect()
    }
}

impl SpectralAnalyzer for FftAnalyzer {
    fn compute_spectral_frame(
        &mut self,
        audio: &[f32],
        low_hz: f32,
        high_hz: f32,
        num_bins: usize,
    ) -> Vec<f32> {
        self.analyze(audio);
        self.band_frame(low_hz, high_hz, num_bins)
    }
}

/// Hann window function for FFT analysis
pub fn hann_window(index: usize, size: usize) -> f32 {
    0.5 * (1.0 - ((2.0 * PI * index as f32) / (size as f32 - 1.0)).cos())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(hz: f32, amplitude: f32, samples: usize, sample_rate: usize) -> Vec<f32> {
        (0..samples)
            .map(|i| amplitude * (2.0 * PI * hz * i as f32 / sample_rate as f32).sin())
            .collect()
    }

    #[test]
    fn test_hann_window() {
        let size = 1024;

        // Hann window should be 0 at edges, 1 at center
        assert!((hann_window(0, size) - 0.0).abs() < 0.01);
        assert!((hann_window(size - 1, size) - 0.0).abs() < 0.01);
        assert!((hann_window(size / 2, size) - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_tone_lands_in_its_band() {
        let config = AnalysisConfig::default();
        let mut analyzer = FftAnalyzer::new(config.clone()).unwrap();
        // Exactly on FFT bin 20 (~107.7 Hz), inside band 17 of 32 over 0-200 Hz
        let hz = 20.0 * config.bin_width_hz();
        let audio = tone(hz, 0.5, config.fft_size, config.sample_rate_hz);

        let frame = analyzer.compute_spectral_frame(&audio, 0.0, 200.0, 32);
        assert_eq!(frame.len(), 32);
        assert!(frame.iter().all(|&a| a >= 0.0));
        let loudest = frame
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(loudest, 17);
        // Hann-windowed unit sine peaks at half its amplitude
        assert!((frame[17] - 0.25).abs() < 0.02);
    }

    #[test]
    fn test_silence_and_short_buffers() {
        let mut analyzer = FftAnalyzer::new(AnalysisConfig::default()).unwrap();
        let frame = analyzer.compute_spectral_frame(&[], 0.0, 200.0, 8);
        assert_eq!(frame, vec![0.0; 8]);

        let frame = analyzer.compute_spectral_frame(&[0.3; 100], 0.0, 200.0, 8);
        assert!(frame.iter().all(|a| a.is_finite()));
    }

    #[test]
    fn test_bands_follow_tone() {
        let config = AnalysisConfig::default();
        let mut analyzer = FftAnalyzer::new(config.clone()).unwrap();
        analyzer.analyze(&tone(2000.0, 0.5, config.fft_size, config.sample_rate_hz));
        let bands = analyzer.bands();
        assert!(bands.high > bands.mid);
        assert!(bands.high > bands.low);
    }
}
