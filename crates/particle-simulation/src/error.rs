//! Error types for the particle field

/// Errors raised by [`crate::ParticleField`] operations
#[derive(Debug, thiserror::Error)]
pub enum FieldError {
    /// A field operation was called before `init`
    #[error("particle field used before init")]
    NotInitialized,

    /// The pixel buffer does not cover the field bounds
    #[error("pixel buffer is {actual_width}x{actual_height}, field is {width}x{height}")]
    PixelBufferSize {
        width: u32,
        height: u32,
        actual_width: u32,
        actual_height: u32,
    },

    /// Raw RGBA data does not match the declared dimensions
    #[error("expected {expected} bytes of RGBA data, got {actual}")]
    PixelDataLength { expected: usize, actual: usize },

    /// Sampling stride of zero
    #[error("sampling gap must be at least 1 pixel")]
    InvalidGap,
}

/// Result type for particle field operations
pub type Result<T> = std::result::Result<T, FieldError>;
