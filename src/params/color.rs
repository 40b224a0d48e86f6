//! Feature-keyed color table and smoothing parameters.

use crate::error::{FieldError, FieldResult};

/// Per-frame interpolation fraction as a function of `dt / smoothing_time_s`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SmoothingCurve {
    /// `clamp(dt / tau, 0, 1)`
    #[default]
    Linear,
    /// `1 - exp(-dt / tau)`: frame-rate independent
    Exponential,
}

/// Energy-driven brightness gain applied on top of the smoothed color.
///
/// Each frame the gain eases toward `1 + min(energy * sensitivity, max_gain - 1)`
/// by `dt * dampening` of the remaining gap; the scaled color is clamped to `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrightnessParams {
    /// Gain added per unit of mean spectral energy
    pub sensitivity: f32,

    /// Upper bound of the gain (>= 1)
    pub max_gain: f32,

    /// Approach rate toward the target gain (1/s)
    pub dampening: f32,
}

impl Default for BrightnessParams {
    fn default() -> Self {
        Self {
            sensitivity: 4.0,
            max_gain: 2.0,
            dampening: 10.0,
        }
    }
}

impl BrightnessParams {
    pub fn validate(&self) -> FieldResult<()> {
        if !(self.sensitivity >= 0.0) || !self.sensitivity.is_finite() {
            return Err(FieldError::configuration(format!(
                "brightness sensitivity must be finite and >= 0, got {}",
                self.sensitivity
            )));
        }
        if !(self.max_gain >= 1.0) || !self.max_gain.is_finite() {
            return Err(FieldError::configuration(format!(
                "brightness max gain must be finite and >= 1, got {}",
                self.max_gain
            )));
        }
        if !(self.dampening > 0.0) || !self.dampening.is_finite() {
            return Err(FieldError::configuration(format!(
                "brightness dampening must be finite and > 0, got {}",
                self.dampening
            )));
        }
        Ok(())
    }
}

/// Color table keyed by feature class, plus the fallback entry
#[derive(Debug, Clone)]
pub struct ColorParams {
    /// `(class, rgb)` entries, channels in `[0, 1]`
    pub table: Vec<(String, [f32; 3])>,

    /// Color used for the `default` class and for unrecognized classes
    pub default_color: [f32; 3],

    /// Smoothing time constant (seconds)
    pub smoothing_time_s: f32,

    pub curve: SmoothingCurve,

    /// Energy-driven brightness gain (disabled when `None`)
    pub brightness: Option<BrightnessParams>,
}

impl Default for ColorParams {
    fn default() -> Self {
        Self {
            table: vec![
                ("low".to_string(), [1.0, 0.35, 0.2]),
                ("mid".to_string(), [0.3, 1.0, 0.45]),
                ("high".to_string(), [0.55, 0.6, 1.0]),
            ],
            default_color: [0.5, 0.5, 1.0],
            smoothing_time_s: 0.25,
            curve: SmoothingCurve::Linear,
            brightness: None,
        }
    }
}

impl ColorParams {
    /// Table with the given entries and the default fallback color
    pub fn with_table<I, S>(entries: I, default_color: [f32; 3]) -> Self
    where
        I: IntoIterator<Item = (S, [f32; 3])>,
        S: Into<String>,
    {
        Self {
            table: entries.into_iter().map(|(k, c)| (k.into(), c)).collect(),
            default_color,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> FieldResult<()> {
        if !(self.smoothing_time_s > 0.0) {
            return Err(FieldError::configuration(format!(
                "color smoothing constant must be > 0, got {}",
                self.smoothing_time_s
            )));
        }
        if let Some(brightness) = &self.brightness {
            brightness.validate()?;
        }
        let colors = self
            .table
            .iter()
            .map(|(key, rgb)| (key.as_str(), rgb))
            .chain(std::iter::once(("default", &self.default_color)));
        for (key, rgb) in colors {
            if rgb.iter().any(|c| !c.is_finite()) {
                return Err(FieldError::configuration(format!(
                    "color for class '{key}' has non-finite channels"
                )));
            }
        }
        Ok(())
    }
}
