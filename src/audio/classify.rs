//! Dominant-band feature classification for the color state machine.

use log::debug;

use super::FftAnalyzer;
use crate::color::DEFAULT_CLASS;
use crate::engine::FeatureClassifier;
use crate::error::FieldResult;
use crate::params::AnalysisConfig;

/// Audio frequency bands extracted via FFT
#[derive(Debug, Clone, Copy, Default)]
pub struct AudioBands {
    pub low: f32,  // Bass (20-200 Hz)
    pub mid: f32,  // Mids (200-1000 Hz)
    pub high: f32, // Highs (1000-4000 Hz)
}

impl AudioBands {
    /// Class key of the loudest band, or `default` when all sit under `floor`
    pub fn dominant(&self, floor: f32) -> &'static str {
        let peak = self.low.max(self.mid).max(self.high);
        if !(peak > floor) {
            DEFAULT_CLASS
        } else if peak == self.low {
            "low"
        } else if peak == self.mid {
            "mid"
        } else {
            "high"
        }
    }
}

/// Labels each buffer `low`, `mid`, or `high` by its dominant band
pub struct BandClassifier {
    analyzer: FftAnalyzer,
    silence_floor: f32,
    last: &'static str,
}

impl BandClassifier {
    pub fn new(config: AnalysisConfig) -> FieldResult<Self> {
        let silence_floor = config.silence_floor;
        Ok(Self {
            analyzer: FftAnalyzer::new(config)?,
            silence_floor,
            last: DEFAULT_CLASS,
        })
    }

    /// Band levels of the most recent classification
    pub fn bands(&self) -> AudioBands {
        self.analyzer.bands()
    }
}

impl FeatureClassifier for BandClassifier {
    fn classify_feature(&mut self, audio: &[f32]) -> String {
        self.analyzer.analyze(audio);
        let class = self.analyzer.bands().dominant(self.silence_floor);
        if class != self.last {
            debug!("Dominant band: {} -> {}", self.last, class);
            self.last = class;
        }
        class.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn tone(hz: f32, config: &AnalysisConfig) -> Vec<f32> {
        (0..config.fft_size)
            .map(|i| 0.5 * (2.0 * PI * hz * i as f32 / config.sample_rate_hz as f32).sin())
            .collect()
    }

    #[test]
    fn test_dominant_band() {
        let bands = AudioBands {
            low: 1.0,
            mid: 0.5,
            high: 0.2,
        };
        assert_eq!(bands.dominant(0.01), "low");
        assert_eq!(bands.dominant(2.0), DEFAULT_CLASS);
        assert_eq!(AudioBands::default().dominant(0.0), DEFAULT_CLASS);
    }

    #[test]
    fn test_tones_classify_by_band() {
        let config = AnalysisConfig::default();
        let mut classifier = BandClassifier::new(config.clone()).unwrap();

        assert_eq!(classifier.classify_feature(&tone(80.0, &config)), "low");
        assert_eq!(classifier.classify_feature(&tone(500.0, &config)), "mid");
        assert_eq!(classifier.classify_feature(&tone(2500.0, &config)), "high");
        assert_eq!(classifier.classify_feature(&vec![0.0; 64]), DEFAULT_CLASS);
    }
}
