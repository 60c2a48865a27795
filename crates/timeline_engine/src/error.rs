// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error types for the timeline engine.

use std::path::PathBuf;

/// Input rejected by the engine.
///
/// The engine's public mutators keep a `bool` contract; these errors are
/// what gets reported as the diagnostic when a call is refused.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    /// Play rate must be finite and strictly positive
    #[error("Invalid play rate: {0} (must be finite and greater than 0)")]
    InvalidPlayRate(f64),

    /// Frame delta clamp must be strictly positive
    #[error("Invalid max frame delta: {0}ms (must be greater than 0)")]
    InvalidFrameDelta(f64),

    /// Frame interval must be strictly positive
    #[error("Invalid frame interval: {0}ms (must be greater than 0)")]
    InvalidFrameInterval(f64),
}

/// Error while loading or validating an [`EngineConfig`](crate::EngineConfig)
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read or written
    #[error("IO error on {path:?}: {source}")]
    Io {
        /// File being accessed
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Config text is not valid RON
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Config could not be serialized
    #[error("Serialization error: {0}")]
    Serialize(#[from] ron::Error),

    /// Config parsed but holds an unusable value
    #[error("Invalid config: {0}")]
    Invalid(#[from] EngineError),
}

/// Result type for engine configuration
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Reject rates that are zero, negative, infinite or NaN.
pub(crate) fn validate_play_rate(rate: f64) -> std::result::Result<f64, EngineError> {
    if rate.is_finite() && rate > 0.0 {
        Ok(rate)
    } else {
        Err(EngineError::InvalidPlayRate(rate))
    }
}
