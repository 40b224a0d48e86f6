//! Note-on schedule: externally timed events that each spawn a pulse.

use log::{debug, warn};

/// Sorted note-on times (seconds) replayed against the frame clock
#[derive(Debug, Clone, Default)]
pub struct NoteSchedule {
    times: Vec<f32>,
}

impl NoteSchedule {
    /// Keep the finite, non-negative times in ascending order
    pub fn new(times: impl IntoIterator<Item = f32>) -> Self {
        let mut kept = Vec::new();
        let mut dropped = 0usize;
        for time in times {
            if time.is_finite() && time >= 0.0 {
                kept.push(time);
            } else {
                dropped += 1;
            }
        }
        if dropped > 0 {
            warn!("Dropped {dropped} invalid note time(s)");
        }
        kept.sort_by(f32::total_cmp);
        debug!("Note schedule: {} notes", kept.len());
        Self { times: kept }
    }

    /// Notes with `start < time <= end`, in order
    pub fn due(&self, start: f32, end: f32) -> &[f32] {
        let lo = self.times.partition_point(|&t| t <= start);
        let hi = self.times.partition_point(|&t| t <= end);
        &self.times[lo..hi.max(lo)]
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}
