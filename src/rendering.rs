//! Offline renderer: writes each frame's field as a tinted heightmap PNG.
//!
//! Grid surfaces map one node to one pixel. Sphere surfaces unwrap
//! equirectangularly, rings down and segments across.

use log::{error, info};

use crate::engine::Renderer;
use crate::error::{FieldError, FieldResult};
use crate::params::RecordingConfig;
use crate::surface::FramePayload;

/// [`Renderer`] that saves every `frame_stride`th frame under the recording directory
pub struct HeightmapRecorder {
    config: RecordingConfig,
    frame_count: usize,
    frames_written: usize,
    first_error: Option<FieldError>,
}

impl HeightmapRecorder {
    /// Create the frames directory and start recording
    pub fn new(config: RecordingConfig) -> FieldResult<Self> {
        if config.frame_stride == 0 {
            return Err(FieldError::configuration("frame stride must be >= 1"));
        }
        std::fs::create_dir_all(config.frames_dir())?;
        info!(
            "Recording to {} ({} fps, every {} frame(s))",
            config.frames_dir(),
            config.fps,
            config.frame_stride
        );

        Ok(Self {
            config,
            frame_count: 0,
            frames_written: 0,
            first_error: None,
        })
    }

    /// RGB pixels for one payload, row-major over the node lattice
    pub fn heightmap(payload: &FramePayload<'_>) -> Vec<u8> {
        let (rows, cols) = payload.dims;
        let mut pixels = Vec::with_capacity(rows * cols * 3);
        for node in 0..rows * cols {
            let level = payload
                .range
                .normalize(payload.field.get(node).copied().unwrap_or(0.0));
            for channel in payload.color {
                pixels.push((channel.clamp(0.0, 1.0) * level * 255.0).round() as u8);
            }
        }
        pixels
    }

    fn save(&self, payload: &FramePayload<'_>) -> FieldResult<()> {
        let (rows, cols) = payload.dims;
        let path = self.config.frame_path(self.frames_written);
        image::save_buffer(
            &path,
            &Self::heightmap(payload),
            cols as u32,
            rows as u32,
            image::ColorType::Rgb8,
        )?;
        Ok(())
    }

    pub fn frames_written(&self) -> usize {
        self.frames_written
    }

    /// Number of frames written, or the first save error
    pub fn finish(self) -> FieldResult<usize> {
        match self.first_error {
            Some(e) => Err(e),
            None => {
                info!(
                    "Recording complete: {} frame(s) in {}",
                    self.frames_written,
                    self.config.frames_dir()
                );
                Ok(self.frames_written)
            }
        }
    }
}

impl Renderer for HeightmapRecorder {
    fn render(&mut self, payload: &FramePayload<'_>) {
        let frame = self.frame_count;
        self.frame_count += 1;
        if frame % self.config.frame_stride != 0 || self.first_error.is_some() {
            return;
        }

        match self.save(payload) {
            Ok(()) => self.frames_written += 1,
            Err(e) => {
                error!("Failed to save frame {}: {}", frame, e);
                self.first_error = Some(e);
            }
        }
    }
}
