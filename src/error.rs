//! Error types shared across the crate.
//!
//! ```text
//! Error
//! ├── VolumeError   (plane access, decoding)
//! └── ConfigError   (option validation, config file loading)
//! ```
//!
//! Degenerate inputs (no spots, no tracks, no regions) are never errors.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("volume error: {0}")]
    Volume(#[from] VolumeError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("results table error: {0}")]
    Csv(#[from] csv::Error),
}

/// Failure to read a plane out of an image volume.
#[derive(Debug, Error)]
pub enum VolumeError {
    /// The requested (channel, depth, frame) address lies outside the volume.
    #[error("plane (c={channel}, z={depth}, t={frame}) is outside volume {dims:?}")]
    PlaneOutOfRange {
        channel: usize,
        depth: usize,
        frame: usize,
        /// (channels, depths, frames)
        dims: (usize, usize, usize),
    },

    /// Pixel data did not match the declared dimensions.
    #[error("pixel buffer of length {actual} does not match shape {expected:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: usize,
    },

    /// The backing file could not be decoded.
    #[error("failed to decode {path:?}: {message}")]
    Decode { path: PathBuf, message: String },
}

/// Invalid pipeline configuration. Raised before any image is processed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("cannot access config file {path:?}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ConfigError {
    pub fn invalid_value(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}
