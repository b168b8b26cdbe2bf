//! Error types for the ass-motion crate
//!
//! Provides the main `MotionError` enum returned by the fallible entry points
//! of the engine. Follows the same philosophy as the rest of the workspace:
//! - Use thiserror for structured error handling (no anyhow)
//! - Provide detailed context for the caller's user-facing message
//! - Keep per-tag failures local: only whole-operation failures surface here

use core::fmt;

use thiserror::Error;

/// Main error type for motion-tracking operations
///
/// Only the top-level checks of an apply operation produce these. Everything
/// below that level (a malformed tag value, an unknown reset style) is
/// recovered locally and never aborts the batch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MotionError {
    /// Tracking data could not be parsed in any supported format
    #[error("Could not parse tracking data: {reason}")]
    DataParse { reason: String },

    /// Tracking data length does not match the selected lines' frame range
    #[error("Frame count mismatch: tracking data has {actual} frames, selected lines span {expected}")]
    LengthMismatch { expected: usize, actual: usize },

    /// Nothing to apply motion to
    #[error("No lines selected")]
    NoLines,

    /// Color value parsing errors
    #[error("Invalid color format: {0}")]
    InvalidColor(String),

    /// Numeric value parsing errors
    #[error("Invalid numeric value: {0}")]
    InvalidNumeric(String),

    /// Option/configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),
}

impl MotionError {
    /// Create a tracking data parse error
    pub fn data_parse<T: fmt::Display>(reason: T) -> Self {
        Self::DataParse {
            reason: reason.to_string(),
        }
    }

    /// Create a configuration error
    pub fn config<T: fmt::Display>(message: T) -> Self {
        Self::Config(message.to_string())
    }

    /// Create an I/O error
    pub fn io<T: fmt::Display>(message: T) -> Self {
        Self::Io(message.to_string())
    }

    /// Check if the user can fix the input and retry
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        match self {
            Self::DataParse { .. }
            | Self::LengthMismatch { .. }
            | Self::NoLines
            | Self::InvalidColor(_)
            | Self::InvalidNumeric(_)
            | Self::Config(_) => true,
            Self::Io(_) => false,
        }
    }

    /// Check if this error was caused by the tracking data itself
    #[must_use]
    pub const fn is_data_error(&self) -> bool {
        matches!(self, Self::DataParse { .. } | Self::LengthMismatch { .. })
    }
}

/// Result type alias for motion operations
pub type Result<T> = core::result::Result<T, MotionError>;

impl From<std::io::Error> for MotionError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(format!("{err}"))
    }
}

impl From<core::num::ParseFloatError> for MotionError {
    fn from(err: core::num::ParseFloatError) -> Self {
        Self::InvalidNumeric(format!("Float parse error: {err}"))
    }
}

#[cfg(feature = "serde")]
impl From<serde_json::Error> for MotionError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(format!("{err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = MotionError::LengthMismatch {
            expected: 10,
            actual: 12,
        };
        assert_eq!(
            err.to_string(),
            "Frame count mismatch: tracking data has 12 frames, selected lines span 10"
        );
        assert_eq!(
            MotionError::data_parse("bad header").to_string(),
            "Could not parse tracking data: bad header"
        );
    }

    #[test]
    fn error_classification() {
        assert!(MotionError::data_parse("x").is_data_error());
        assert!(MotionError::LengthMismatch {
            expected: 1,
            actual: 2
        }
        .is_data_error());
        assert!(!MotionError::NoLines.is_data_error());
        assert!(MotionError::config("x").is_recoverable());
        assert!(!MotionError::io("disk").is_recoverable());
    }

    #[test]
    fn error_conversion() {
        let parse_err = "abc".parse::<f64>().unwrap_err();
        let err: MotionError = parse_err.into();
        assert!(matches!(err, MotionError::InvalidNumeric(_)));

        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: MotionError = io_err.into();
        assert!(matches!(err, MotionError::Io(_)));
    }
}
