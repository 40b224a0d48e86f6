//! Kick (bass onset) detection driving pulse triggers.

use std::f32::consts::PI;

use log::debug;

use crate::error::FieldResult;
use crate::params::AnalysisConfig;

/// Energy-ratio onset detector on low-passed audio.
///
/// Fed the samples that arrived since the previous frame (one hop); fires when
/// the hop's low-band energy jumps above `kick_threshold × running mean`.
pub struct KickDetector {
    alpha: f32,
    threshold: f32,
    min_energy: f32,
    mean_rate: f32,
    refractory_s: f32,
    lowpassed: f32,
    mean_energy: f32,
    last_kick_s: Option<f32>,
    kick_count: u64,
}

impl KickDetector {
    pub fn new(config: &AnalysisConfig) -> FieldResult<Self> {
        config.validate()?;
        let sample_rate_hz = config.sample_rate_hz as f32;
        Ok(Self {
            // One-pole low-pass coefficient
            alpha: 1.0 - (-2.0 * PI * config.kick_cutoff_hz / sample_rate_hz).exp(),
            threshold: config.kick_threshold,
            min_energy: config.kick_min_energy,
            mean_rate: config.kick_mean_rate,
            refractory_s: config.kick_refractory_s,
            lowpassed: 0.0,
            mean_energy: 0.0,
            last_kick_s: None,
            kick_count: 0,
        })
    }

    /// Mean squared low-passed amplitude of `hop`
    fn hop_energy(&mut self, hop: &[f32]) -> f32 {
        if hop.is_empty() {
            return 0.0;
        }
        let mut sum = 0.0;
        for &sample in hop {
            let sample = if sample.is_finite() { sample } else { 0.0 };
            self.lowpassed += self.alpha * (sample - self.lowpassed);
            sum += self.lowpassed * self.lowpassed;
        }
        sum / hop.len() as f32
    }

    /// Consume one hop ending at `time_s`; true on a kick
    pub fn detect(&mut self, hop: &[f32], time_s: f32) -> bool {
        let energy = self.hop_energy(hop);
        let rested = self
            .last_kick_s
            .map_or(true, |last| time_s - last >= self.refractory_s);
        let kick = rested && energy > self.min_energy && energy > self.threshold * self.mean_energy;

        self.mean_energy += self.mean_rate * (energy - self.mean_energy);
        if kick {
            self.last_kick_s = Some(time_s);
            self.kick_count += 1;
            debug!(
                "Kick at {:.3}s (energy {:.4}, mean {:.4})",
                time_s, energy, self.mean_energy
            );
        }
        kick
    }

    pub fn kick_count(&self) -> u64 {
        self.kick_count
    }
}
