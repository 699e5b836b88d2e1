//! Error types for the lava-lamp core.
//!
//! Only construction, configuration and I/O paths fail with an
//! [`EngineError`]. Per-frame anomalies (out-of-range grid probes,
//! degenerate contour walks, balls caught mid-resize) are recovered where
//! they happen and surface as trace outcomes, never as errors.

use thiserror::Error;

/// Errors produced while building or configuring engines.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Width or height was zero, non-finite, or too large to address.
    #[error("invalid dimensions: width and height must be non-zero and fit in memory")]
    InvalidDimensions,

    /// A color string could not be parsed.
    #[error("invalid color: {0}")]
    InvalidColor(String),

    /// A configuration value was out of range or inconsistent.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// A parameter existed but had the wrong JSON type.
    #[error("parameter type mismatch for '{name}': expected {expected}, got {got}")]
    ParamTypeMismatch {
        name: String,
        expected: String,
        got: String,
    },

    /// Reading a config file or writing an image failed.
    #[error("i/o error: {0}")]
    Io(String),
}
