//! Spectral band mapping: one bin amplitude per surface node.
//!
//! Each node's radial coordinate is normalized to `p ∈ [0, 1]` once at
//! construction (distance / max distance on a grid, inclination / π on a
//! sphere). Per frame, node value = `gain * frame[bin(p)]` with
//! `bin(p) = clamp(floor(p * bins), 0, bins - 1)`, so low bins land at the
//! center or pole and high bins at the rim or opposite pole.
//!
//! [`BinInterpolation::Linear`] is an opt-in variant that blends the two
//! nearest bin centers instead of using hard band edges.

use log::warn;

use super::ValueRange;
use crate::error::{FieldError, FieldResult};
use crate::params::{BinInterpolation, SpectrumParams};
use crate::surface::Surface;

/// Bin selected by normalized parameter `p` among `bins` bins
pub fn bin_index(p: f32, bins: usize) -> usize {
    if bins == 0 || !(p > 0.0) {
        return 0;
    }
    ((p * bins as f32).floor() as usize).min(bins - 1)
}

/// Non-negative, finite amplitude of `bin`; missing bins read as zero
fn amplitude(frame: &[f32], bin: usize) -> f32 {
    match frame.get(bin) {
        Some(&a) if a.is_finite() && a > 0.0 => a,
        _ => 0.0,
    }
}

/// Mean amplitude of a frame, counting unusable bins as zero (0 when empty)
pub fn frame_energy(frame: &[f32]) -> f32 {
    if frame.is_empty() {
        return 0.0;
    }
    (0..frame.len()).map(|bin| amplitude(frame, bin)).sum::<f32>() / frame.len() as f32
}

/// Maps spectral frames onto surface nodes
pub struct SpectralMapper {
    bins: usize,
    gain: f32,
    expected_peak: f32,
    interpolation: BinInterpolation,
    strict_frames: bool,
    /// Normalized radial parameter per node
    params: Vec<f32>,
    buffer: Vec<f32>,
    last_bad_len: Option<usize>,
}

impl SpectralMapper {
    pub fn new(surface: &Surface, spectrum: &SpectrumParams) -> FieldResult<Self> {
        spectrum.validate()?;
        let params: Vec<f32> = (0..surface.node_count())
            .map(|node| surface.normalized_radial(node))
            .collect();

        Ok(Self {
            bins: spectrum.num_bins,
            gain: spectrum.gain,
            expected_peak: spectrum.expected_peak,
            interpolation: spectrum.interpolation,
            strict_frames: spectrum.strict_frames,
            buffer: vec![0.0; params.len()],
            params,
            last_bad_len: None,
        })
    }

    pub fn bins(&self) -> usize {
        self.bins
    }

    /// Bin each node reads under nearest mapping
    pub fn node_bin(&self, node: usize) -> usize {
        bin_index(self.params[node], self.bins)
    }

    /// Reject frames whose length differs from the configured bin count
    pub fn check_frame(&self, frame: &[f32]) -> FieldResult<()> {
        if frame.len() == self.bins {
            Ok(())
        } else {
            Err(FieldError::out_of_range(format!(
                "spectral frame has {} bins, expected {}",
                frame.len(),
                self.bins
            )))
        }
    }

    /// Recompute the spectral field for this frame's bins.
    ///
    /// Wrong-length frames are zero-filled or truncated (and logged once per
    /// distinct length); with `strict_frames` they panic in debug builds.
    pub fn map(&mut self, frame: &[f32]) -> &[f32] {
        if let Err(e) = self.check_frame(frame) {
            debug_assert!(!self.strict_frames, "{e}");
            if self.last_bad_len != Some(frame.len()) {
                warn!("{e}; missing bins read as zero");
                self.last_bad_len = Some(frame.len());
            }
        }

        let bins = self.bins;
        let gain = self.gain;
        match self.interpolation {
            BinInterpolation::Nearest => {
                for (out, &p) in self.buffer.iter_mut().zip(&self.params) {
                    *out = gain * amplitude(frame, bin_index(p, bins));
                }
            }
            BinInterpolation::Linear => {
                let last = (bins - 1) as f32;
                for (out, &p) in self.buffer.iter_mut().zip(&self.params) {
                    // Bin centers sit at (i + 0.5) / bins
                    let position = (p * bins as f32 - 0.5).clamp(0.0, last);
                    let lower = position.floor() as usize;
                    let upper = (lower + 1).min(bins - 1);
                    let t = position - lower as f32;
                    let a = amplitude(frame, lower);
                    let b = amplitude(frame, upper);
                    *out = gain * (a + (b - a) * t);
                }
            }
        }
        &self.buffer
    }

    /// Most recently mapped field
    pub fn field(&self) -> &[f32] {
        &self.buffer
    }

    /// Theoretical range given the configured nominal peak amplitude
    pub fn value_range(&self) -> ValueRange {
        ValueRange::new(0.0, self.gain * self.expected_peak)
    }
}
