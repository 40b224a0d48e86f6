//! Closed-form speed profiles and front falloff shapes for transient pulses.

use std::f32::consts::PI;

use crate::error::{FieldError, FieldResult};

/// One point of a piecewise-linear speed curve
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedKeyframe {
    /// Seconds since the event was triggered
    pub time_s: f32,
    /// Propagation speed at that time (distance units per second)
    pub speed: f32,
}

/// Instantaneous front speed as a function of elapsed time.
///
/// Front position is the exact integral of the speed, so it depends only on
/// elapsed time and never on how many frames were stepped to get there.
#[derive(Debug, Clone, PartialEq)]
pub enum SpeedProfile {
    /// `v(t) = speed`
    Constant { speed: f32 },

    /// `v(t) = initial_speed * exp(-decay_rate * t)`; the front stalls at
    /// `initial_speed / decay_rate`
    Decaying { initial_speed: f32, decay_rate: f32 },

    /// Piecewise-linear speed through keyframes sorted by time; the first
    /// speed holds before the first keyframe and the last one after the end
    Curve { keyframes: Vec<SpeedKeyframe> },
}

impl SpeedProfile {
    /// Instantaneous speed `elapsed_s` seconds after the trigger
    pub fn speed_at(&self, elapsed_s: f32) -> f32 {
        let t = elapsed_s.max(0.0);
        match self {
            Self::Constant { speed } => *speed,
            Self::Decaying {
                initial_speed,
                decay_rate,
            } => initial_speed * (-decay_rate * t).exp(),
            Self::Curve { keyframes } => curve_speed(keyframes, t),
        }
    }

    /// Distance travelled by the front: `∫ v(τ) dτ` over `[0, elapsed_s]`
    pub fn distance(&self, elapsed_s: f32) -> f32 {
        let t = elapsed_s.max(0.0);
        match self {
            Self::Constant { speed } => speed * t,
            Self::Decaying {
                initial_speed,
                decay_rate,
            } => {
                if *decay_rate <= f32::EPSILON {
                    initial_speed * t
                } else {
                    // -expm1 keeps precision for small rate * t
                    initial_speed * -(-decay_rate * t).exp_m1() / decay_rate
                }
            }
            Self::Curve { keyframes } => curve_distance(keyframes, t),
        }
    }

    /// Limit of [`distance`](Self::distance) as time grows, if finite
    pub fn terminal_distance(&self) -> Option<f32> {
        match self {
            Self::Constant { speed } => (*speed <= 0.0).then_some(0.0),
            Self::Decaying {
                initial_speed,
                decay_rate,
            } => {
                if *decay_rate > f32::EPSILON {
                    Some(initial_speed / decay_rate)
                } else {
                    (*initial_speed <= 0.0).then_some(0.0)
                }
            }
            Self::Curve { keyframes } => match keyframes.last() {
                Some(last) if last.speed > 0.0 => None,
                Some(last) => Some(curve_distance(keyframes, last.time_s)),
                None => Some(0.0),
            },
        }
    }

    pub fn validate(&self) -> FieldResult<()> {
        match self {
            Self::Constant { speed } => {
                if !(*speed >= 0.0) || !speed.is_finite() {
                    return Err(FieldError::configuration(format!(
                        "pulse speed must be finite and >= 0, got {speed}"
                    )));
                }
            }
            Self::Decaying {
                initial_speed,
                decay_rate,
            } => {
                if !(*initial_speed >= 0.0) || !initial_speed.is_finite() {
                    return Err(FieldError::configuration(format!(
                        "pulse initial speed must be finite and >= 0, got {initial_speed}"
                    )));
                }
                if !(*decay_rate >= 0.0) || !decay_rate.is_finite() {
                    return Err(FieldError::configuration(format!(
                        "pulse decay rate must be finite and >= 0, got {decay_rate}"
                    )));
                }
            }
            Self::Curve { keyframes } => {
                if keyframes.is_empty() {
                    return Err(FieldError::configuration(
                        "speed curve needs at least one keyframe",
                    ));
                }
                let mut previous = 0.0f32;
                for key in keyframes {
                    if !key.time_s.is_finite() || key.time_s < previous {
                        return Err(FieldError::configuration(format!(
                            "speed curve keyframes must be sorted and non-negative, got t={}",
                            key.time_s
                        )));
                    }
                    if !(key.speed >= 0.0) || !key.speed.is_finite() {
                        return Err(FieldError::configuration(format!(
                            "speed curve speeds must be finite and >= 0, got {}",
                            key.speed
                        )));
                    }
                    previous = key.time_s;
                }
            }
        }
        Ok(())
    }
}

impl Default for SpeedProfile {
    fn default() -> Self {
        Self::Constant { speed: 2.0 }
    }
}

fn curve_speed(keys: &[SpeedKeyframe], t: f32) -> f32 {
    let (Some(first), Some(last)) = (keys.first(), keys.last()) else {
        return 0.0;
    };
    if t <= first.time_s {
        return first.speed;
    }
    for pair in keys.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if t <= b.time_s {
            let span = b.time_s - a.time_s;
            if span <= 0.0 {
                return b.speed;
            }
            return a.speed + (b.speed - a.speed) * (t - a.time_s) / span;
        }
    }
    last.speed
}

fn curve_distance(keys: &[SpeedKeyframe], t: f32) -> f32 {
    let (Some(first), Some(last)) = (keys.first(), keys.last()) else {
        return 0.0;
    };
    if t <= first.time_s {
        return first.speed * t;
    }
    let mut distance = first.speed * first.time_s;
    for pair in keys.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let end = t.min(b.time_s);
        // Trapezoid over the linear segment [a.time, end]
        distance += 0.5 * (a.speed + curve_speed(keys, end)) * (end - a.time_s);
        if t <= b.time_s {
            return distance;
        }
    }
    distance + last.speed * (t - last.time_s)
}

/// Cross-section of a front: weight as a function of distance from it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FalloffProfile {
    /// `0.5 * (1 + cos(π x))`
    #[default]
    RaisedCosine,
    /// Gaussian with σ = width / 3, shifted and rescaled to reach 0 at the edge
    Gaussian,
}

/// `x²` coefficient for σ = width / 3
const GAUSSIAN_SHARPNESS: f32 = 4.5;

impl FalloffProfile {
    /// Weight in `[0, 1]` for a node `offset` away from the front.
    ///
    /// Symmetric, 1 at `offset == 0`, 0 for `|offset| >= width`.
    pub fn weight(self, offset: f32, width: f32) -> f32 {
        let x = offset.abs() / width;
        if !(x < 1.0) {
            return 0.0;
        }
        match self {
            Self::RaisedCosine => 0.5 * (1.0 + (PI * x).cos()),
            Self::Gaussian => {
                let edge = (-GAUSSIAN_SHARPNESS).exp();
                ((-GAUSSIAN_SHARPNESS * x * x).exp() - edge) / (1.0 - edge)
            }
        }
    }
}
