//! Parameter definitions with physical units and documented semantics.
//!
//! All tunables are extracted here with:
//! - Units in field names (seconds, Hz, meters, grid cells)
//! - Documented defaults
//! - A `validate()` that rejects values the engine cannot run with

mod audio;
mod color;
mod pulse;
mod render;
mod spectrum;
mod surface;

// Re-export all types
pub use audio::{audio_constants, AnalysisConfig};
pub use color::{BrightnessParams, ColorParams, SmoothingCurve};
pub use pulse::PulseParams;
pub use render::RecordingConfig;
pub use spectrum::{BinInterpolation, SpectrumParams};
pub use surface::{SurfaceParams, SurfaceShape};

use crate::error::FieldResult;

/// Complete engine configuration, immutable after construction
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub surface: SurfaceParams,
    pub pulse: PulseParams,
    pub spectrum: SpectrumParams,
    pub color: ColorParams,
}

impl EngineConfig {
    /// Sphere surface with pulse defaults scaled to radians
    pub fn sphere(rings: usize, segments: usize) -> Self {
        Self {
            surface: SurfaceParams::sphere(rings, segments),
            pulse: PulseParams::for_sphere(),
            ..Self::default()
        }
    }

    /// Validate every section
    pub fn validate(&self) -> FieldResult<()> {
        self.surface.validate()?;
        self.pulse.validate()?;
        self.spectrum.validate()?;
        self.color.validate()
    }
}
