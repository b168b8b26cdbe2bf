//! Option persistence
//!
//! Options are stored as a JSON object with a `main` section and an optional
//! `clip` section:
//!
//! ```json
//! {
//!   "main": { "xPosition": true, "yPosition": true, "startFrame": 1 },
//!   "clip": { "rectClip": true }
//! }
//! ```

pub mod options;

pub use options::{ClipTrackOptions, MotionOptions};

#[cfg(feature = "serde")]
use std::path::Path;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "serde")]
use crate::utils::Result;

/// Saved main and clip options
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MotionConfig {
    pub main: MotionOptions,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub clip: Option<ClipTrackOptions>,
}

#[cfg(feature = "serde")]
impl MotionConfig {
    /// Parse a configuration from JSON text
    ///
    /// # Errors
    ///
    /// Returns `MotionError::Config` on malformed JSON or mistyped values.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to pretty-printed JSON
    ///
    /// # Errors
    ///
    /// Returns `MotionError::Config` if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a configuration file
    ///
    /// # Errors
    ///
    /// Returns `MotionError::Io` if the file cannot be read and
    /// `MotionError::Config` if it is not a valid configuration.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Write the configuration to a file
    ///
    /// # Errors
    ///
    /// Returns `MotionError::Io` if the file cannot be written.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}
