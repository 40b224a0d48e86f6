//! Command-line argument parsing.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::field::SpeedProfile;
use crate::params::{
    AnalysisConfig, BrightnessParams, EngineConfig, RecordingConfig, SmoothingCurve,
    SurfaceParams,
};

/// Surface variant selectable from the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SurfaceKind {
    Grid,
    Sphere,
}

/// Smoothing curve selectable from the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CurveKind {
    Linear,
    Exponential,
}

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "membrane")]
#[command(about = "Render an audio clip as an audio-reactive surface field", long_about = None)]
pub struct Args {
    /// WAV file to analyse (synthesizes the built-in composition when omitted)
    #[arg(long, value_name = "PATH")]
    pub input: Option<PathBuf>,

    /// Seconds to render (clip length when an input file is given)
    #[arg(long, value_name = "SECONDS")]
    pub duration: Option<f32>,

    /// Frames per second
    #[arg(long, value_name = "FPS", default_value = "60")]
    pub fps: u32,

    /// Surface variant
    #[arg(long, value_enum, default_value = "grid")]
    pub surface: SurfaceKind,

    /// Grid nodes per side
    #[arg(long, value_name = "NODES", default_value = "128")]
    pub grid_size: usize,

    /// Sphere latitude rings
    #[arg(long, value_name = "RINGS", default_value = "64")]
    pub rings: usize,

    /// Sphere longitude segments
    #[arg(long, value_name = "SEGMENTS", default_value = "128")]
    pub segments: usize,

    /// Output directory for frames
    #[arg(long, value_name = "DIR", default_value = "recording")]
    pub output: String,

    /// Write every Nth frame
    #[arg(long, value_name = "N", default_value = "1")]
    pub frame_stride: usize,

    /// Spectral bins mapped onto the surface
    #[arg(long, value_name = "BINS", default_value = "32")]
    pub bins: usize,

    /// Lower edge of the mapped spectrum (Hz)
    #[arg(long, value_name = "HZ", default_value = "0")]
    pub low_hz: f32,

    /// Upper edge of the mapped spectrum (Hz)
    #[arg(long, value_name = "HZ", default_value = "200")]
    pub high_hz: f32,

    /// Color smoothing time constant (seconds)
    #[arg(long, value_name = "SECONDS", default_value = "0.25")]
    pub smoothing: f32,

    /// Color smoothing curve
    #[arg(long, value_enum, default_value = "linear")]
    pub curve: CurveKind,

    /// Pulse front speed (surface units per second)
    #[arg(long, value_name = "SPEED")]
    pub pulse_speed: Option<f32>,

    /// Pulse front width (surface units)
    #[arg(long, value_name = "WIDTH")]
    pub pulse_width: Option<f32>,

    /// Brightness gain per unit of spectral energy (brightness modulation off when omitted)
    #[arg(long, value_name = "GAIN")]
    pub brightness: Option<f32>,

    /// Note-on times that each spawn a pulse, comma separated (seconds)
    #[arg(long, value_name = "SECONDS", value_delimiter = ',')]
    pub notes: Vec<f32>,

    /// Sample rate used when synthesizing audio (Hz)
    #[arg(long, value_name = "HZ", default_value = "44100")]
    pub sample_rate: usize,
}

impl Args {
    /// Engine configuration with command-line overrides applied
    pub fn engine_config(&self) -> EngineConfig {
        let mut config = match self.surface {
            SurfaceKind::Grid => EngineConfig {
                surface: SurfaceParams::grid(self.grid_size),
                ..EngineConfig::default()
            },
            SurfaceKind::Sphere => EngineConfig::sphere(self.rings, self.segments),
        };

        config.spectrum.num_bins = self.bins;
        config.spectrum.low_hz = self.low_hz;
        config.spectrum.high_hz = self.high_hz;
        config.color.smoothing_time_s = self.smoothing;
        config.color.curve = match self.curve {
            CurveKind::Linear => SmoothingCurve::Linear,
            CurveKind::Exponential => SmoothingCurve::Exponential,
        };
        if let Some(speed) = self.pulse_speed {
            config.pulse.speed = SpeedProfile::Constant { speed };
        }
        if let Some(width) = self.pulse_width {
            config.pulse.front_width = width;
        }
        config.color.brightness = self.brightness.map(|sensitivity| BrightnessParams {
            sensitivity,
            ..BrightnessParams::default()
        });
        config
    }

    /// Analysis configuration for a clip at `sample_rate_hz`
    pub fn analysis_config(&self, sample_rate_hz: usize) -> AnalysisConfig {
        AnalysisConfig {
            sample_rate_hz,
            ..AnalysisConfig::default()
        }
    }

    /// Recording configuration for `duration_secs` of output
    pub fn recording_config(&self, duration_secs: f32) -> RecordingConfig {
        RecordingConfig {
            output_dir: self.output.clone(),
            fps: self.fps,
            frame_stride: self.frame_stride,
            ..RecordingConfig::new(duration_secs)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::SurfaceShape;

    #[test]
    fn test_defaults_build_valid_config() {
        let args = Args::try_parse_from(["membrane"]).unwrap();
        let config = args.engine_config();
        assert!(config.validate().is_ok());
        assert!(matches!(
            config.surface.shape,
            SurfaceShape::Grid { size: 128, .. }
        ));
        assert_eq!(args.recording_config(2.0).total_frames(), 120);
        assert_eq!(config.color.brightness, None);
        assert!(args.notes.is_empty());
    }

    #[test]
    fn test_brightness_and_notes() {
        let args = Args::try_parse_from([
            "membrane",
            "--brightness",
            "6",
            "--notes",
            "0.5,1.25,3",
        ])
        .unwrap();
        let config = args.engine_config();
        assert!(config.validate().is_ok());
        assert_eq!(
            config.color.brightness,
            Some(BrightnessParams {
                sensitivity: 6.0,
                ..BrightnessParams::default()
            })
        );
        assert_eq!(args.notes, vec![0.5, 1.25, 3.0]);
    }

    #[test]
    fn test_sphere_overrides() {
        let args = Args::try_parse_from([
            "membrane",
            "--surface",
            "sphere",
            "--rings",
            "16",
            "--segments",
            "24",
            "--bins",
            "12",
            "--curve",
            "exponential",
            "--pulse-speed",
            "2.5",
        ])
        .unwrap();
        let config = args.engine_config();
        assert!(matches!(
            config.surface.shape,
            SurfaceShape::Sphere {
                rings: 16,
                segments: 24
            }
        ));
        assert_eq!(config.spectrum.num_bins, 12);
        assert_eq!(config.color.curve, SmoothingCurve::Exponential);
        assert_eq!(config.pulse.speed, SpeedProfile::Constant { speed: 2.5 });
    }

    #[test]
    fn test_invalid_overrides_surface_at_validation() {
        let args = Args::try_parse_from(["membrane", "--bins", "0"]).unwrap();
        assert!(args.engine_config().validate().is_err());
    }
}
