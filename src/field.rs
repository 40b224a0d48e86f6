//! Per-node scalar fields: spectral bands, transient pulses, and their merge.

mod compositor;
mod profile;
mod pulse;
mod spectral;

pub use compositor::{FieldCompositor, SourceId, ValueRange};
pub use profile::{FalloffProfile, SpeedKeyframe, SpeedProfile};
pub use pulse::{PulsePropagator, TransientEvent};
pub use spectral::{bin_index, frame_energy, SpectralMapper};
