//! Membrane library - audio-reactive scalar fields on grid and sphere surfaces
//!
//! Spectral bands and propagating transient pulses are merged into one field
//! per surface node, while a feature-keyed color eases toward its target.

pub mod audio;
pub mod cli;
pub mod color;
pub mod engine;
pub mod error;
pub mod field;
pub mod params;
pub mod rendering;
pub mod surface;

pub use engine::{FieldEngine, FrameDriver, FrameInput};
pub use error::{FieldError, FieldResult};
pub use params::EngineConfig;
