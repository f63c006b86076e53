//! Error types for the lighting pipeline

use thiserror::Error;

/// Lighting pipeline errors
///
/// Frame execution itself never fails; capacity limits are clamped and
/// reported through [`crate::stats::LightingStats`]. These errors cover
/// construction and configuration mistakes.
#[derive(Debug, Error)]
pub enum LightingError {
    /// Two buffers that must share dimensions do not
    #[error("Buffer dimension mismatch: expected {expected:?}, found {found:?}")]
    DimensionMismatch {
        expected: (u32, u32),
        found: (u32, u32),
    },

    /// Configuration that cannot be clamped into a usable state
    #[error("Invalid lighting configuration: {0}")]
    InvalidConfig(String),

    /// Pass registered after a pass of a later slot
    #[error("Pass '{pass}' ({slot:?}) registered after a {previous:?} pass")]
    PassOrder {
        pass: String,
        slot: crate::pipeline::PassSlot,
        previous: crate::pipeline::PassSlot,
    },

    /// A pass was started while another one was still running
    #[error("Pass '{0}' is still in progress")]
    PassInProgress(String),

    /// A pass step was requested with no pass running
    #[error("No lighting pass is in progress")]
    NoActivePass,

    /// Every registered pass already ran this frame
    #[error("All {0} lighting passes already ran this frame")]
    FrameComplete(usize),

    /// Config (de)serialization failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for lighting operations
pub type Result<T> = std::result::Result<T, LightingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LightingError::DimensionMismatch { expected: (16, 16), found: (8, 16) };
        assert_eq!(err.to_string(), "Buffer dimension mismatch: expected (16, 16), found (8, 16)");

        let err = LightingError::PassInProgress("shadow_cast".into());
        assert_eq!(err.to_string(), "Pass 'shadow_cast' is still in progress");

        let err = LightingError::FrameComplete(3);
        assert_eq!(err.to_string(), "All 3 lighting passes already ran this frame");
    }
}
