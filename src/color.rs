//! Feature-keyed color state: a level-triggered target with smoothed approach.
//!
//! Every frame the classifier's class selects a target color (unknown classes
//! select the `default` entry), and the current color moves a clamped
//! fraction of the way there. There is no terminal state; the only observable
//! phases are at rest on the target, or transitioning toward it.
//!
//! An optional brightness gain, eased toward a level set by spectral energy,
//! scales the smoothed color into the displayed color.

use std::collections::HashMap;

use glam::Vec3;
use log::{debug, info};

use crate::error::FieldResult;
use crate::params::{BrightnessParams, ColorParams, SmoothingCurve};

/// Class name that always maps to the fallback color
pub const DEFAULT_CLASS: &str = "default";

/// Channel distance under which the color counts as settled
const REST_EPSILON: f32 = 1e-4;

/// Observable state of the color machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorPhase {
    AtRest,
    Transitioning,
}

fn clamp_color(rgb: [f32; 3]) -> Vec3 {
    Vec3::from_array(rgb).clamp(Vec3::ZERO, Vec3::ONE)
}

/// Non-negative finite seconds; anything else counts as no time passing
fn sanitize_dt(dt: f32) -> f32 {
    if dt.is_finite() {
        dt.max(0.0)
    } else {
        0.0
    }
}

/// Smoothed color driven by per-frame feature classifications
#[derive(Debug, Clone)]
pub struct FeatureColorState {
    table: HashMap<String, Vec3>,
    default_color: Vec3,
    smoothing_time_s: f32,
    curve: SmoothingCurve,
    current: Vec3,
    target: Vec3,
    last_class: Option<String>,
    brightness: Option<BrightnessParams>,
    gain: f32,
}

impl FeatureColorState {
    /// Start at rest on the default color
    pub fn new(params: &ColorParams) -> FieldResult<Self> {
        params.validate()?;
        let table: HashMap<String, Vec3> = params
            .table
            .iter()
            .map(|(class, rgb)| (class.clone(), clamp_color(*rgb)))
            .collect();
        let default_color = clamp_color(params.default_color);
        info!(
            "Color table: {} classes + default, smoothing {:.3}s ({:?})",
            table.len(),
            params.smoothing_time_s,
            params.curve
        );

        Ok(Self {
            table,
            default_color,
            smoothing_time_s: params.smoothing_time_s,
            curve: params.curve,
            current: default_color,
            target: default_color,
            last_class: None,
            brightness: params.brightness,
            gain: 1.0,
        })
    }

    /// Fraction of the remaining distance covered in `dt` seconds, in `[0, 1]`
    pub fn step_fraction(&self, dt: f32) -> f32 {
        let ratio = sanitize_dt(dt) / self.smoothing_time_s;
        let fraction = match self.curve {
            SmoothingCurve::Linear => ratio,
            SmoothingCurve::Exponential => -(-ratio).exp_m1(),
        };
        fraction.clamp(0.0, 1.0)
    }

    /// Color configured for `class`, if it is a recognized key
    pub fn color_for(&self, class: &str) -> Option<Vec3> {
        if class == DEFAULT_CLASS {
            return Some(self.default_color);
        }
        self.table.get(class).copied()
    }

    /// Apply this frame's classification, then advance the current color by `dt`
    pub fn update(&mut self, class: &str, dt: f32) -> Vec3 {
        match self.color_for(class) {
            Some(color) => {
                if self.last_class.as_deref() != Some(class) {
                    debug!("Feature class -> '{class}'");
                    self.last_class = Some(class.to_string());
                }
                self.target = color;
            }
            None => {
                debug!("Unrecognized feature class '{class}', using default color");
                self.target = self.default_color;
            }
        }

        let fraction = self.step_fraction(dt);
        self.current = if fraction >= 1.0 {
            self.target
        } else {
            self.current
                .lerp(self.target, fraction)
                .clamp(Vec3::ZERO, Vec3::ONE)
        };
        self.current
    }

    /// Ease the brightness gain toward the level set by `energy`, then
    /// return the displayed color. Without brightness params the gain stays 1.
    pub fn modulate(&mut self, energy: f32, dt: f32) -> Vec3 {
        if let Some(params) = self.brightness {
            let energy = if energy.is_finite() { energy.max(0.0) } else { 0.0 };
            let target = 1.0 + (energy * params.sensitivity).min(params.max_gain - 1.0);
            let fraction = (sanitize_dt(dt) * params.dampening).clamp(0.0, 1.0);
            self.gain += (target - self.gain) * fraction;
        }
        self.displayed()
    }

    /// Smoothed color before brightness
    pub fn current(&self) -> Vec3 {
        self.current
    }

    /// Smoothed color scaled by the brightness gain, channels in `[0, 1]`
    pub fn displayed(&self) -> Vec3 {
        (self.current * self.gain).clamp(Vec3::ZERO, Vec3::ONE)
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    /// Last recognized class seen, if any
    pub fn last_feature_class(&self) -> Option<&str> {
        self.last_class.as_deref()
    }

    pub fn phase(&self) -> ColorPhase {
        let gap = (self.target - self.current).abs().max_element();
        if gap <= REST_EPSILON {
            ColorPhase::AtRest
        } else {
            ColorPhase::Transitioning
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: [f32; 3] = [1.0, 0.0, 0.2];
    const DEFAULT: [f32; 3] = [0.1, 0.6, 0.9];

    fn machine(curve: SmoothingCurve) -> FeatureColorState {
        let mut params = ColorParams::with_table([("a", A), ("e", [0.0, 1.0, 0.0])], DEFAULT);
        params.smoothing_time_s = 0.2;
        params.curve = curve;
        FeatureColorState::new(&params).unwrap()
    }

    #[test]
    fn test_starts_at_rest_on_default() {
        let state = machine(SmoothingCurve::Linear);
        assert_eq!(state.current(), Vec3::from_array(DEFAULT));
        assert_eq!(state.phase(), ColorPhase::AtRest);
        assert_eq!(state.last_feature_class(), None);
    }

    #[test]
    fn test_monotonic_convergence_without_overshoot() {
        for curve in [SmoothingCurve::Linear, SmoothingCurve::Exponential] {
            for dt in [0.0, 0.001, 0.016, 0.1, 0.2, 0.5, 10.0] {
                let mut state = machine(curve);
                let target = Vec3::from_array(A);
                let mut previous_gap = (target - state.current()).abs();
                for _ in 0..200 {
                    let current = state.update("a", dt);
                    let gap = (target - current).abs();
                    // Per channel: never grows, never crosses the target
                    assert!(gap.cmple(previous_gap + Vec3::splat(1e-7)).all());
                    for c in 0..3 {
                        let start = DEFAULT[c];
                        let lo = start.min(A[c]) - 1e-6;
                        let hi = start.max(A[c]) + 1e-6;
                        assert!(current[c] >= lo && current[c] <= hi);
                    }
                    previous_gap = gap;
                }
                if dt >= 0.016 {
                    assert!((state.current() - target).abs().max_element() < 1e-2);
                }
            }
        }
    }

    #[test]
    fn test_large_dt_snaps_to_target() {
        let mut state = machine(SmoothingCurve::Linear);
        assert_eq!(state.step_fraction(5.0), 1.0);
        let current = state.update("a", 5.0);
        assert_eq!(current, Vec3::from_array(A));
        assert_eq!(state.phase(), ColorPhase::AtRest);
    }

    #[test]
    fn test_bad_dt_is_ignored() {
        let mut state = machine(SmoothingCurve::Linear);
        assert_eq!(state.step_fraction(-1.0), 0.0);
        assert_eq!(state.step_fraction(f32::NAN), 0.0);
        assert_eq!(state.step_fraction(f32::INFINITY), 0.0);
        let before = state.current();
        state.update("a", f32::NAN);
        assert_eq!(state.current(), before);
        assert_eq!(state.phase(), ColorPhase::Transitioning);
    }

    #[test]
    fn test_vowel_sequence_changes_target_twice() {
        let mut state = machine(SmoothingCurve::Linear);
        let mut targets = vec![state.target()];
        let mut previous = state.current();
        let dt = 1.0 / 60.0;

        let frames = std::iter::repeat("a").take(10).chain(std::iter::once("default"));
        for class in frames {
            let current = state.update(class, dt);
            // Continuous: each frame moves at most dt / tau of the remaining gap
            let jump = (current - previous).abs().max_element();
            assert!(jump <= state.step_fraction(dt) + 1e-6);
            previous = current;
            if *targets.last().unwrap() != state.target() {
                targets.push(state.target());
            }
        }

        assert_eq!(
            targets,
            vec![
                Vec3::from_array(DEFAULT),
                Vec3::from_array(A),
                Vec3::from_array(DEFAULT)
            ]
        );
        assert_eq!(state.last_feature_class(), Some(DEFAULT_CLASS));
    }

    #[test]
    fn test_unknown_class_falls_back_to_default() {
        let mut state = machine(SmoothingCurve::Linear);
        state.update("a", 0.01);
        state.update("zz", 0.01);
        assert_eq!(state.target(), Vec3::from_array(DEFAULT));
        // Unrecognized classes do not overwrite the last recognized one
        assert_eq!(state.last_feature_class(), Some("a"));
    }

    #[test]
    fn test_table_colors_are_clamped() {
        let params = ColorParams::with_table([("hot", [2.0, -1.0, 0.5])], DEFAULT);
        let mut state = FeatureColorState::new(&params).unwrap();
        let current = state.update("hot", 100.0);
        assert_eq!(current, Vec3::new(1.0, 0.0, 0.5));
    }

    fn bright_machine() -> FeatureColorState {
        let mut params = ColorParams::with_table([("a", A)], [0.4, 0.2, 0.1]);
        params.brightness = Some(BrightnessParams {
            sensitivity: 2.0,
            max_gain: 2.0,
            dampening: 10.0,
        });
        FeatureColorState::new(&params).unwrap()
    }

    #[test]
    fn test_brightness_follows_energy() {
        let mut state = bright_machine();
        assert_eq!(state.gain(), 1.0);

        // Target gain 1 + 0.25 * 2 = 1.5; dt * dampening = 0.5 covers half the gap
        let shown = state.modulate(0.25, 0.05);
        assert!((state.gain() - 1.25).abs() < 1e-6);
        assert!((shown - Vec3::new(0.5, 0.25, 0.125)).abs().max_element() < 1e-6);

        // Large dt lands on the target; loud input is capped at max_gain
        state.modulate(100.0, 1.0);
        assert_eq!(state.gain(), 2.0);
        assert!((state.displayed() - Vec3::new(0.8, 0.4, 0.2)).abs().max_element() < 1e-6);

        // Silence eases back to unity
        state.modulate(0.0, 1.0);
        assert_eq!(state.gain(), 1.0);
        assert_eq!(state.displayed(), state.current());
    }

    #[test]
    fn test_displayed_color_is_clamped() {
        let mut params = ColorParams::with_table([("a", A)], [0.9, 0.5, 0.0]);
        params.brightness = Some(BrightnessParams {
            sensitivity: 10.0,
            max_gain: 3.0,
            dampening: 10.0,
        });
        let mut state = FeatureColorState::new(&params).unwrap();
        let shown = state.modulate(1.0, 1.0);
        assert_eq!(state.gain(), 3.0);
        assert_eq!(shown, Vec3::new(1.0, 1.0, 0.0));
        // The hue state itself is untouched
        assert_eq!(state.current(), Vec3::new(0.9, 0.5, 0.0));
    }

    #[test]
    fn test_brightness_ignores_bad_input() {
        let mut state = bright_machine();
        state.modulate(f32::NAN, 1.0);
        assert_eq!(state.gain(), 1.0);
        state.modulate(1.0, f32::NAN);
        assert_eq!(state.gain(), 1.0);
        state.modulate(-5.0, 1.0);
        assert_eq!(state.gain(), 1.0);

        // Disabled brightness leaves the color as smoothed
        let mut plain = machine(SmoothingCurve::Linear);
        assert_eq!(plain.modulate(50.0, 1.0), Vec3::from_array(DEFAULT));
        assert_eq!(plain.gain(), 1.0);
    }

    #[test]
    fn test_rejects_non_positive_smoothing() {
        let mut params = ColorParams::default();
        params.smoothing_time_s = -0.5;
        assert!(FeatureColorState::new(&params).is_err());
    }
}
