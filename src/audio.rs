//! Reference collaborators: audio loading, FFT spectra, kick onsets, note
//! schedules, band classes.

mod classify;
mod clip;
mod fft;
mod onset;
mod schedule;
mod synthesis;

pub use classify::{AudioBands, BandClassifier};
pub use clip::{load_or_synthesize, AudioClip};
pub use fft::{hann_window, FftAnalyzer};
pub use onset::KickDetector;
pub use schedule::NoteSchedule;
pub use synthesis::{render_composition, GLICOL_COMPOSITION};
