//! Transient pulse parameters.

use crate::error::{FieldError, FieldResult};
use crate::field::{FalloffProfile, SpeedProfile};

/// Parameters copied into every triggered transient event
#[derive(Debug, Clone)]
pub struct PulseParams {
    /// Peak height of each pulse front (field units)
    pub amplitude: f32,

    /// Half-width of the front: contribution reaches zero this far from it
    /// (surface distance units: grid cells, or radians on a sphere)
    pub front_width: f32,

    /// Propagation speed over the event's lifetime
    pub speed: SpeedProfile,

    /// Shape of the front cross-section
    pub falloff: FalloffProfile,

    /// Maximum simultaneously active events; the oldest is dropped beyond this
    pub max_active_events: usize,

    /// Optional age limit (seconds) for fronts that stall before leaving the surface
    pub max_lifetime_s: Option<f32>,
}

impl Default for PulseParams {
    fn default() -> Self {
        Self {
            amplitude: 1.0,
            front_width: 3.0,
            speed: SpeedProfile::Constant { speed: 48.0 }, // cells per second
            falloff: FalloffProfile::RaisedCosine,
            max_active_events: 32,
            max_lifetime_s: None,
        }
    }
}

impl PulseParams {
    /// Defaults scaled for a unit sphere parametrized in radians
    pub fn for_sphere() -> Self {
        Self {
            front_width: 0.2,
            speed: SpeedProfile::Constant { speed: 1.2 }, // radians per second
            ..Self::default()
        }
    }

    pub fn validate(&self) -> FieldResult<()> {
        if !self.amplitude.is_finite() {
            return Err(FieldError::configuration(format!(
                "pulse amplitude must be finite, got {}",
                self.amplitude
            )));
        }
        if !(self.front_width > 0.0) || !self.front_width.is_finite() {
            return Err(FieldError::configuration(format!(
                "pulse front width must be > 0, got {}",
                self.front_width
            )));
        }
        if self.max_active_events == 0 {
            return Err(FieldError::configuration("max active events must be > 0"));
        }
        if let Some(lifetime) = self.max_lifetime_s {
            if !(lifetime > 0.0) {
                return Err(FieldError::configuration(format!(
                    "max pulse lifetime must be > 0, got {lifetime}"
                )));
            }
        }
        self.speed.validate()
    }
}
