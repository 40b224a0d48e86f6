//! Offline recording configuration.

/// Recording mode configuration
#[derive(Debug, Clone)]
pub struct RecordingConfig {
    /// Duration to record (seconds)
    pub duration_secs: f32,

    /// Output directory for frames
    pub output_dir: String,

    /// Frame rate (FPS)
    pub fps: u32,

    /// Write every Nth frame (1 = every frame)
    pub frame_stride: usize,
}

impl RecordingConfig {
    pub fn new(duration_secs: f32) -> Self {
        Self {
            duration_secs,
            output_dir: "recording".to_string(),
            fps: 60,
            frame_stride: 1,
        }
    }

    /// Total number of frames to simulate
    pub fn total_frames(&self) -> usize {
        (self.duration_secs.max(0.0) * self.fps as f32).ceil() as usize
    }

    /// Seconds between frames
    pub fn frame_dt(&self) -> f32 {
        1.0 / self.fps.max(1) as f32
    }

    /// Frame directory path
    pub fn frames_dir(&self) -> String {
        format!("{}/frames", self.output_dir)
    }

    /// Path of one frame image
    pub fn frame_path(&self, frame_num: usize) -> String {
        format!("{}/frame_{:05}.png", self.frames_dir(), frame_num)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_frames_rounds_up() {
        let config = RecordingConfig::new(1.01);
        assert_eq!(config.total_frames(), 61);
        assert_eq!(RecordingConfig::new(-1.0).total_frames(), 0);
    }

    #[test]
    fn test_frame_path_layout() {
        let config = RecordingConfig::new(1.0);
        assert_eq!(config.frame_path(7), "recording/frames/frame_00007.png");
    }
}
