//! Error taxonomy for engine construction and the reference collaborators.

/// Convenience result type used across the crate.
pub type FieldResult<T> = Result<T, FieldError>;

/// Errors raised by the field engine and its collaborators.
///
/// Only `Configuration` is produced by the core, and only at construction.
/// Per-frame input problems are reported as `OutOfRange` by validation helpers
/// but the engine itself recovers from them and never returns them from a frame.
#[derive(thiserror::Error, Debug)]
pub enum FieldError {
    /// Invalid parameters detected when building a component.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Per-frame input outside the configured shape (wrong bin count, unknown key).
    #[error("input out of range: {0}")]
    OutOfRange(String),

    /// Audio source or synthesis failure.
    #[error("audio error: {0}")]
    Audio(String),

    /// WAV decoding failure.
    #[error(transparent)]
    Wav(#[from] hound::Error),

    /// Frame image encoding failure.
    #[error(transparent)]
    Image(#[from] image::ImageError),

    /// Filesystem failure while recording.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl FieldError {
    /// Build a [`FieldError::Configuration`] value.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Build a [`FieldError::OutOfRange`] value.
    pub fn out_of_range(msg: impl Into<String>) -> Self {
        Self::OutOfRange(msg.into())
    }

    /// Build a [`FieldError::Audio`] value.
    pub fn audio(msg: impl Into<String>) -> Self {
        Self::Audio(msg.into())
    }
}
