//! Transient pulse propagation: radial fronts expanding from trigger points.
//!
//! Each event's front radius is the closed-form distance of its speed profile
//! at the elapsed time, so the field at a given wall-clock time does not
//! depend on frame rate. Nodes are found through a per-origin radial index
//! (node distances sorted once), so each event only visits the annulus
//! `|d - r| < front_width` instead of the whole surface.

use std::sync::Arc;

use log::{debug, trace, warn};

use super::{SpeedProfile, ValueRange};
use crate::error::FieldResult;
use crate::params::PulseParams;
use crate::surface::{Surface, SurfacePoint};

/// Nodes sorted by distance from one origin
#[derive(Debug)]
struct RadialIndex {
    origin: SurfacePoint,
    /// `(distance, node)` ascending by distance
    entries: Vec<(f32, u32)>,
}

impl RadialIndex {
    fn build(surface: &Surface, origin: SurfacePoint) -> Self {
        let mut entries: Vec<(f32, u32)> = (0..surface.node_count())
            .map(|node| (surface.distance(&origin, node), node as u32))
            .collect();
        entries.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self { origin, entries }
    }

    /// Farthest node distance from the origin
    fn max_extent(&self) -> f32 {
        self.entries.last().map_or(0.0, |e| e.0)
    }

    /// Entries with `lo < distance < hi`
    fn band(&self, lo: f32, hi: f32) -> &[(f32, u32)] {
        let start = self.entries.partition_point(|e| e.0 <= lo);
        let end = self.entries.partition_point(|e| e.0 < hi);
        &self.entries[start..end.max(start)]
    }
}

/// A single traveling front
#[derive(Debug, Clone)]
pub struct TransientEvent {
    pub origin_time: f32,
    pub origin: SurfacePoint,
    pub amplitude: f32,
    pub front_width: f32,
    pub speed_profile: SpeedProfile,
    index: Arc<RadialIndex>,
}

impl TransientEvent {
    /// Seconds since trigger, never negative
    pub fn elapsed(&self, current_time: f32) -> f32 {
        (current_time - self.origin_time).max(0.0)
    }

    /// `∫ speed` from trigger time to `current_time`
    pub fn front_radius(&self, current_time: f32) -> f32 {
        self.speed_profile.distance(self.elapsed(current_time))
    }

    /// Farthest node distance from this event's origin
    pub fn max_extent(&self) -> f32 {
        self.index.max_extent()
    }

    /// True once the trailing edge of the front has left the surface
    pub fn has_left_surface(&self, current_time: f32) -> bool {
        self.front_radius(current_time) - self.front_width > self.max_extent()
    }
}

/// Owns the active transient events and their accumulated field
pub struct PulsePropagator {
    params: PulseParams,
    center: Arc<RadialIndex>,
    events: Vec<TransientEvent>,
    buffer: Vec<f32>,
    evicted: u64,
}

impl PulsePropagator {
    pub fn new(surface: &Surface, params: PulseParams) -> FieldResult<Self> {
        params.validate()?;
        if let Some(stall) = params.speed.terminal_distance() {
            if stall - params.front_width <= surface.max_radial() && params.max_lifetime_s.is_none() {
                debug!(
                    "Pulse fronts stall at {stall:.3} inside the surface; \
                     only the event cap bounds them"
                );
            }
        }

        Ok(Self {
            center: Arc::new(RadialIndex::build(surface, surface.center())),
            events: Vec::with_capacity(params.max_active_events),
            buffer: vec![0.0; surface.node_count()],
            evicted: 0,
            params,
        })
    }

    /// Spawn a new event at `origin` (surface center when `None`).
    ///
    /// When the active set is full the oldest event is dropped first. A
    /// non-finite `origin_time` is ignored.
    pub fn trigger(&mut self, surface: &Surface, origin_time: f32, origin: Option<SurfacePoint>) {
        if !origin_time.is_finite() {
            warn!("Ignoring pulse trigger at non-finite time {origin_time}");
            return;
        }
        let origin = surface.resolve(origin);
        let index = self.index_for(surface, origin);

        if self.events.len() >= self.params.max_active_events {
            self.events.remove(0);
            self.evicted += 1;
            debug!(
                "Pulse cap of {} reached, dropped oldest event",
                self.params.max_active_events
            );
        }

        trace!("Pulse triggered at t={origin_time:.3} from {origin:?}");
        self.events.push(TransientEvent {
            origin_time,
            origin,
            amplitude: self.params.amplitude,
            front_width: self.params.front_width,
            speed_profile: self.params.speed.clone(),
            index,
        });
    }

    /// Share an existing radial index for `origin`, or build one
    fn index_for(&self, surface: &Surface, origin: SurfacePoint) -> Arc<RadialIndex> {
        if self.center.origin == origin {
            return Arc::clone(&self.center);
        }
        self.events
            .iter()
            .find(|e| e.index.origin == origin)
            .map(|e| Arc::clone(&e.index))
            .unwrap_or_else(|| Arc::new(RadialIndex::build(surface, origin)))
    }

    /// Recompute the transient field at `current_time`, then evict spent events.
    ///
    /// Eviction runs after accumulation, so events leaving this frame still
    /// contribute to this frame's field. A non-finite `current_time` leaves
    /// the previous field and the active set untouched.
    pub fn advance(&mut self, current_time: f32) -> &[f32] {
        if !current_time.is_finite() {
            warn!("Pulse clock is non-finite ({current_time}), holding last field");
            return &self.buffer;
        }
        self.buffer.fill(0.0);
        let falloff = self.params.falloff;

        for event in &self.events {
            let radius = event.front_radius(current_time);
            let width = event.front_width;
            for &(distance, node) in event.index.band(radius - width, radius + width) {
                self.buffer[node as usize] +=
                    event.amplitude * falloff.weight(distance - radius, width);
            }
        }

        let max_lifetime = self.params.max_lifetime_s;
        let before = self.events.len();
        self.events.retain(|event| {
            let expired = max_lifetime.is_some_and(|l| event.elapsed(current_time) > l);
            !(event.has_left_surface(current_time) || expired)
        });
        let removed = before - self.events.len();
        if removed > 0 {
            self.evicted += removed as u64;
            trace!("Evicted {removed} pulse(s) at t={current_time:.3}");
        }

        &self.buffer
    }

    /// Most recently computed transient field
    pub fn field(&self) -> &[f32] {
        &self.buffer
    }

    pub fn active_events(&self) -> &[TransientEvent] {
        &self.events
    }

    /// Total events removed so far (left the surface, expired, or capped)
    pub fn evicted_count(&self) -> u64 {
        self.evicted
    }

    /// Drop all active events
    pub fn clear(&mut self) {
        self.events.clear();
        self.buffer.fill(0.0);
    }

    /// Theoretical range: every capped event peaking on the same node
    pub fn value_range(&self) -> ValueRange {
        ValueRange::new(
            0.0,
            self.params.amplitude * self.params.max_active_events as f32,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::SpeedKeyframe;
    use crate::params::{SurfaceParams, SurfaceShape};

    fn scenario_surface() -> Surface {
        let params = SurfaceParams {
            shape: SurfaceShape::Grid {
                size: 4,
                origin: Some([2.0, 2.0]),
            },
            ..SurfaceParams::default()
        };
        Surface::new(&params).unwrap()
    }

    fn scenario_params() -> PulseParams {
        PulseParams {
            amplitude: 1.0,
            front_width: 0.1,
            speed: SpeedProfile::Constant { speed: 2.0 },
            ..PulseParams::default()
        }
    }

    #[test]
    fn test_scenario_front_at_radius_two() {
        let surface = scenario_surface();
        let mut pulses = PulsePropagator::new(&surface, scenario_params()).unwrap();
        pulses.trigger(&surface, 0.0, None);

        assert!((pulses.active_events()[0].front_radius(1.0) - 2.0).abs() < 1e-6);
        let field = pulses.advance(1.0).to_vec();

        for node in 0..surface.node_count() {
            let d = surface.spatial_coordinate(node).radial;
            if (d - 2.0).abs() < 1e-6 {
                assert!((field[node] - 1.0).abs() < 1e-5, "node {node} at d={d}");
            } else if d == 0.0 || d >= 4.0 {
                assert!(field[node].abs() < 1e-6);
            }
        }
        // (0, 2) sits two rows above the origin
        assert!((field[2] - 1.0).abs() < 1e-5);
        assert_eq!(field[2 * 4 + 2], 0.0);
    }

    #[test]
    fn test_front_independent_of_frame_steps() {
        let surface = Surface::new(&SurfaceParams::grid(32)).unwrap();
        let params = PulseParams {
            speed: SpeedProfile::Decaying {
                initial_speed: 20.0,
                decay_rate: 0.7,
            },
            ..PulseParams::default()
        };

        let mut coarse = PulsePropagator::new(&surface, params.clone()).unwrap();
        let mut fine = PulsePropagator::new(&surface, params).unwrap();
        coarse.trigger(&surface, 0.25, None);
        fine.trigger(&surface, 0.25, None);

        coarse.advance(1.5);
        for step in 1..=997 {
            fine.advance(0.25 + 1.25 * step as f32 / 997.0);
        }
        let target = 1.5;
        fine.advance(target);

        let a = coarse.active_events()[0].front_radius(target);
        let b = fine.active_events()[0].front_radius(target);
        assert_eq!(a, b);
        assert_eq!(coarse.field(), fine.field());
        let expected = SpeedProfile::Decaying {
            initial_speed: 20.0,
            decay_rate: 0.7,
        }
        .distance(1.25);
        assert!((a - expected).abs() < 1e-5);
    }

    #[test]
    fn test_events_accumulate() {
        let surface = scenario_surface();
        let mut pulses = PulsePropagator::new(&surface, scenario_params()).unwrap();
        pulses.trigger(&surface, 0.0, None);
        pulses.trigger(&surface, 0.0, None);
        let field = pulses.advance(1.0);
        assert!((field[2] - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_eviction_after_accumulation() {
        let surface = scenario_surface();
        let mut pulses = PulsePropagator::new(&surface, scenario_params()).unwrap();
        pulses.trigger(&surface, 0.0, None);
        let max_extent = pulses.active_events()[0].max_extent();
        assert!((max_extent - 8f32.sqrt()).abs() < 1e-6);

        // Front just touching the farthest node: still alive
        let t_touch = max_extent / 2.0;
        let field = pulses.advance(t_touch).to_vec();
        assert_eq!(pulses.active_events().len(), 1);
        assert!((field[0] - 1.0).abs() < 1e-4);

        // Trailing edge past the rim: evicted after this frame's pass
        let t_gone = (max_extent + 0.1 + 0.01) / 2.0;
        pulses.advance(t_gone);
        assert!(pulses.active_events().is_empty());
        assert_eq!(pulses.evicted_count(), 1);

        // And the next frame is clean
        assert!(pulses.advance(t_gone + 0.1).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_eviction_does_not_disturb_other_events() {
        let surface = scenario_surface();
        let mut pulses = PulsePropagator::new(&surface, scenario_params()).unwrap();
        pulses.trigger(&surface, 0.0, None);
        pulses.trigger(&surface, 1.0, None);

        // Old front at radius 4 has left the surface; young front peaks at radius 2
        let t = 2.0;
        let field = pulses.advance(t).to_vec();
        assert_eq!(pulses.active_events().len(), 1);
        assert!((field[2] - 1.0).abs() < 1e-5);

        let mut alone = PulsePropagator::new(&surface, scenario_params()).unwrap();
        alone.trigger(&surface, 1.0, None);
        assert_eq!(alone.advance(t), field.as_slice());
    }

    #[test]
    fn test_cap_bounds_active_set() {
        let surface = scenario_surface();
        let params = PulseParams {
            max_active_events: 3,
            ..scenario_params()
        };
        let mut pulses = PulsePropagator::new(&surface, params).unwrap();
        for i in 0..10 {
            pulses.trigger(&surface, i as f32 * 0.01, None);
        }
        assert_eq!(pulses.active_events().len(), 3);
        // Oldest were dropped
        assert!((pulses.active_events()[0].origin_time - 0.07).abs() < 1e-6);
        assert_eq!(pulses.evicted_count(), 7);
        assert_eq!(pulses.value_range(), ValueRange::new(0.0, 3.0));
    }

    #[test]
    fn test_stalled_front_expires_by_lifetime() {
        let surface = Surface::new(&SurfaceParams::grid(16)).unwrap();
        let params = PulseParams {
            speed: SpeedProfile::Decaying {
                initial_speed: 2.0,
                decay_rate: 1.0,
            },
            max_lifetime_s: Some(3.0),
            ..PulseParams::default()
        };
        let mut pulses = PulsePropagator::new(&surface, params).unwrap();
        pulses.trigger(&surface, 0.0, None);
        pulses.advance(2.9);
        assert_eq!(pulses.active_events().len(), 1);
        pulses.advance(3.1);
        assert!(pulses.active_events().is_empty());
    }

    #[test]
    fn test_custom_origin_and_index_sharing() {
        let surface = Surface::new(&SurfaceParams::grid(8)).unwrap();
        let mut pulses = PulsePropagator::new(&surface, scenario_params()).unwrap();
        let corner = SurfacePoint::Grid { row: 0.0, col: 0.0 };
        pulses.trigger(&surface, 0.0, Some(corner));
        pulses.trigger(&surface, 0.5, Some(corner));

        let events = pulses.active_events();
        assert!(Arc::ptr_eq(&events[0].index, &events[1].index));
        assert!((events[0].max_extent() - (2.0 * 49.0f32).sqrt()).abs() < 1e-5);

        // Radius 2 from the corner hits (0, 2) and (2, 0)
        let field = pulses.advance(1.0).to_vec();
        assert!((field[2] - 1.0).abs() < 1e-5);
        assert!((field[2 * 8] - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_pulse_on_sphere() {
        let surface = Surface::new(&SurfaceParams::sphere(16, 8)).unwrap();
        let params = PulseParams {
            front_width: 0.05,
            speed: SpeedProfile::Curve {
                keyframes: vec![SpeedKeyframe {
                    time_s: 0.0,
                    speed: std::f32::consts::FRAC_PI_2,
                }],
            },
            ..PulseParams::default()
        };
        let mut pulses = PulsePropagator::new(&surface, params).unwrap();
        pulses.trigger(&surface, 0.0, None);

        // After 1s the front sits on the equator (ring 8 of 16)
        let field = pulses.advance(1.0).to_vec();
        let (_, cols) = surface.dims();
        for col in 0..cols {
            assert!((field[8 * cols + col] - 1.0).abs() < 1e-3);
        }
        assert_eq!(field[0], 0.0);

        // After the front passes π + width it is gone
        pulses.advance(2.1);
        assert!(pulses.active_events().is_empty());
    }

    #[test]
    fn test_non_finite_trigger_time_is_ignored() {
        let surface = scenario_surface();
        let mut pulses = PulsePropagator::new(&surface, scenario_params()).unwrap();
        pulses.trigger(&surface, f32::NAN, None);
        pulses.trigger(&surface, f32::INFINITY, None);
        assert!(pulses.active_events().is_empty());

        for t in [0.5, 10.0, 100.0] {
            let field = pulses.advance(t);
            assert_eq!(field[2 * 4 + 2], 0.0);
        }
        assert!(pulses.active_events().is_empty());
        assert_eq!(pulses.evicted_count(), 0);
    }

    #[test]
    fn test_non_finite_clock_holds_last_field() {
        let surface = scenario_surface();
        let mut pulses = PulsePropagator::new(&surface, scenario_params()).unwrap();
        pulses.trigger(&surface, 0.0, None);
        let before = pulses.advance(1.0).to_vec();

        assert_eq!(pulses.advance(f32::NAN), before.as_slice());
        assert_eq!(pulses.advance(f32::NEG_INFINITY), before.as_slice());
        assert_eq!(pulses.active_events().len(), 1);

        // The clock recovering resumes normal propagation and eviction
        pulses.advance(10.0);
        assert!(pulses.active_events().is_empty());
    }

    #[test]
    fn test_clear_drops_events_and_field() {
        let surface = scenario_surface();
        let mut pulses = PulsePropagator::new(&surface, scenario_params()).unwrap();
        pulses.trigger(&surface, 0.0, None);
        pulses.trigger(&surface, 0.2, None);
        assert!(pulses.advance(1.0).iter().any(|&v| v > 0.0));

        pulses.clear();
        assert!(pulses.active_events().is_empty());
        assert!(pulses.field().iter().all(|&v| v == 0.0));
        // Cleared events are not counted as evicted
        assert_eq!(pulses.evicted_count(), 0);
        assert!(pulses.advance(1.1).iter().all(|&v| v == 0.0));
    }
}
