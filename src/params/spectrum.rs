//! Spectral band mapping parameters.

use crate::error::{FieldError, FieldResult};

/// How a node's normalized position selects spectral amplitude
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BinInterpolation {
    /// `floor(p * bins)`: hard band edges
    #[default]
    Nearest,
    /// Linear blend between the two nearest bin centers (smoothed band edges)
    Linear,
}

/// Spectral band and mapping parameters
#[derive(Debug, Clone)]
pub struct SpectrumParams {
    /// Low edge of the analysed band (Hz)
    pub low_hz: f32,

    /// High edge of the analysed band (Hz)
    pub high_hz: f32,

    /// Bins per spectral frame
    pub num_bins: usize,

    /// Multiplier applied to every bin amplitude
    pub gain: f32,

    /// Nominal maximum bin amplitude, used only to report the field range
    pub expected_peak: f32,

    pub interpolation: BinInterpolation,

    /// Panic on wrong-length frames in debug builds instead of zero-filling
    pub strict_frames: bool,
}

impl Default for SpectrumParams {
    fn default() -> Self {
        Self {
            low_hz: 0.0,
            high_hz: 200.0,
            num_bins: 32,
            gain: 1.0,
            expected_peak: 1.0,
            interpolation: BinInterpolation::Nearest,
            strict_frames: false,
        }
    }
}

impl SpectrumParams {
    pub fn validate(&self) -> FieldResult<()> {
        if self.num_bins == 0 {
            return Err(FieldError::configuration("spectral bin count must be > 0"));
        }
        if !(self.low_hz >= 0.0) || !(self.high_hz > self.low_hz) {
            return Err(FieldError::configuration(format!(
                "spectral band must satisfy 0 <= low < high, got [{}, {}]",
                self.low_hz, self.high_hz
            )));
        }
        if !self.gain.is_finite() {
            return Err(FieldError::configuration(format!(
                "spectral gain must be finite, got {}",
                self.gain
            )));
        }
        if !(self.expected_peak >= 0.0) {
            return Err(FieldError::configuration(format!(
                "expected spectral peak must be >= 0, got {}",
                self.expected_peak
            )));
        }
        Ok(())
    }
}
