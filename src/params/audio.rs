//! Audio analysis configuration for the reference collaborators.

use std::ops::Range;

use crate::error::{FieldError, FieldResult};

/// FFT analysis configuration with frequency band mappings
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Audio sample rate (Hz)
    pub sample_rate_hz: usize,

    /// FFT window size (must be power of 2)
    /// 8192 @ 44.1kHz ≈ 5.4 Hz per bin, enough to split 0-200 Hz into 32 bands
    pub fft_size: usize,

    /// Bass frequency range (Hz), used by the band classifier
    pub bass_range_hz: (f32, f32),

    /// Mid frequency range (Hz)
    pub mid_range_hz: (f32, f32),

    /// High frequency range (Hz)
    pub high_range_hz: (f32, f32),

    /// Mean band magnitude below which the classifier reports the default class
    pub silence_floor: f32,

    /// Low-pass cutoff applied before kick energy measurement (Hz)
    pub kick_cutoff_hz: f32,

    /// Kick fires when hop energy exceeds this multiple of the running mean
    pub kick_threshold: f32,

    /// Absolute hop energy a kick must exceed
    pub kick_min_energy: f32,

    /// Running-mean update rate per hop, in (0, 1]
    pub kick_mean_rate: f32,

    /// Minimum time between kicks (seconds)
    pub kick_refractory_s: f32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: 44100,
            fft_size: 8192,
            bass_range_hz: (20.0, 200.0),
            mid_range_hz: (200.0, 1000.0),
            high_range_hz: (1000.0, 4000.0),
            silence_floor: 1e-4,
            kick_cutoff_hz: 150.0,
            kick_threshold: 2.0,
            kick_min_energy: 1e-3,
            kick_mean_rate: 0.1,
            kick_refractory_s: 0.12,
        }
    }
}

impl AnalysisConfig {
    /// Convert frequency (Hz) to FFT bin index
    pub fn hz_to_bin(&self, hz: f32) -> usize {
        ((hz.max(0.0) * self.fft_size as f32) / self.sample_rate_hz as f32) as usize
    }

    /// Width of one FFT bin (Hz)
    pub fn bin_width_hz(&self) -> f32 {
        self.sample_rate_hz as f32 / self.fft_size as f32
    }

    /// FFT bin range covering `[low_hz, high_hz]`, limited to the Nyquist half.
    /// Never empty.
    pub fn bin_range(&self, low_hz: f32, high_hz: f32) -> Range<usize> {
        let nyquist = self.fft_size / 2;
        let start = self.hz_to_bin(low_hz).min(nyquist.saturating_sub(1));
        let end = (self.hz_to_bin(high_hz) + 1).clamp(start + 1, nyquist);
        start..end
    }

    /// Get FFT bin range for bass frequencies
    pub fn bass_bins(&self) -> Range<usize> {
        self.bin_range(self.bass_range_hz.0, self.bass_range_hz.1)
    }

    /// Get FFT bin range for mid frequencies
    pub fn mid_bins(&self) -> Range<usize> {
        self.bin_range(self.mid_range_hz.0, self.mid_range_hz.1)
    }

    /// Get FFT bin range for high frequencies
    pub fn high_bins(&self) -> Range<usize> {
        self.bin_range(self.high_range_hz.0, self.high_range_hz.1)
    }

    /// Validate configuration (FFT size must be power of 2, etc.)
    pub fn validate(&self) -> FieldResult<()> {
        if !self.fft_size.is_power_of_two() || self.fft_size < 2 {
            return Err(FieldError::configuration(format!(
                "FFT size must be a power of 2 (>= 2), got {}",
                self.fft_size
            )));
        }
        if self.sample_rate_hz == 0 {
            return Err(FieldError::configuration("sample rate must be > 0"));
        }
        if !(self.kick_mean_rate > 0.0 && self.kick_mean_rate <= 1.0) {
            return Err(FieldError::configuration(format!(
                "kick mean rate must be in (0, 1], got {}",
                self.kick_mean_rate
            )));
        }
        if !(self.kick_cutoff_hz > 0.0) || self.kick_refractory_s < 0.0 {
            return Err(FieldError::configuration(
                "kick cutoff must be > 0 and refractory period >= 0",
            ));
        }
        Ok(())
    }
}

/// Audio constants (compile-time, match Glicol engine setup)
pub mod audio_constants {
    /// Audio block size (samples per buffer)
    pub const BLOCK_SIZE: usize = 128;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hz_to_bin() {
        let config = AnalysisConfig {
            fft_size: 1024,
            ..AnalysisConfig::default()
        };

        // At 44100 Hz sample rate and 1024 FFT size:
        // Bin resolution = 44100 / 1024 ≈ 43.07 Hz per bin
        assert_eq!(config.hz_to_bin(0.0), 0);
        assert_eq!(config.hz_to_bin(43.07), 1);
        assert_eq!(config.hz_to_bin(100.0), 2);
    }

    #[test]
    fn test_band_ranges_ordered() {
        let config = AnalysisConfig::default();

        let bass = config.bass_bins();
        let mid = config.mid_bins();
        let high = config.high_bins();

        assert!(!bass.is_empty());
        assert!(mid.start + 1 >= bass.end);
        assert!(high.start + 1 >= mid.end);
        assert!(high.end <= config.fft_size / 2);
    }

    #[test]
    fn test_bin_range_never_empty() {
        let config = AnalysisConfig::default();
        let range = config.bin_range(100.0, 100.0);
        assert_eq!(range.len(), 1);

        let above_nyquist = config.bin_range(30_000.0, 40_000.0);
        assert!(!above_nyquist.is_empty());
        assert!(above_nyquist.end <= config.fft_size / 2);
    }

    #[test]
    fn test_validate_rejects_odd_fft_size() {
        let config = AnalysisConfig {
            fft_size: 1000,
            ..AnalysisConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(FieldError::Configuration(_))
        ));
    }
}
