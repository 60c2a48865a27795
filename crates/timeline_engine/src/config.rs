// SPDX-License-Identifier: MIT OR Apache-2.0
//! Engine configuration.
//!
//! Stored as RON:
//!
//! ```ron
//! (
//!     initial_play_rate: 1.0,
//!     max_frame_delta_ms: 1000.0,
//!     frame_interval_ms: 16.666666666666668,
//! )
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::clock::RealtimeClock;
use crate::error::{validate_play_rate, ConfigError, EngineError, Result};

/// Tunables for a [`TimelineEngine`](crate::TimelineEngine)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Play rate the engine starts with
    pub initial_play_rate: f64,
    /// Largest wall-clock gap a single tick may consume. Keeps playback
    /// from jumping after the host stopped delivering frames for a while.
    pub max_frame_delta_ms: f64,
    /// Refresh interval of the built-in real-time clock
    pub frame_interval_ms: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            initial_play_rate: 1.0,
            max_frame_delta_ms: 1000.0,
            frame_interval_ms: RealtimeClock::DEFAULT_INTERVAL_MS,
        }
    }
}

impl EngineConfig {
    /// Check every value is usable
    pub fn validate(&self) -> std::result::Result<(), EngineError> {
        validate_play_rate(self.initial_play_rate)?;
        if self.max_frame_delta_ms.is_nan() || self.max_frame_delta_ms <= 0.0 {
            return Err(EngineError::InvalidFrameDelta(self.max_frame_delta_ms));
        }
        if !self.frame_interval_ms.is_finite() || self.frame_interval_ms <= 0.0 {
            return Err(EngineError::InvalidFrameInterval(self.frame_interval_ms));
        }
        Ok(())
    }

    /// Parse and validate a RON document
    pub fn from_ron_str(text: &str) -> Result<Self> {
        let config: EngineConfig = ron::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty RON
    pub fn to_ron_string(&self) -> Result<String> {
        let pretty = ron::ser::PrettyConfig::default().struct_names(false);
        Ok(ron::ser::to_string_pretty(self, pretty)?)
    }

    /// Load from a RON file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_ron_str(&text)?;
        tracing::info!("Loaded engine config from {:?}", path);
        Ok(config)
    }

    /// Write to a RON file
    pub fn save(&self, path: &Path) -> Result<()> {
        let text = self.to_ron_string()?;
        std::fs::write(path, text).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = EngineConfig::default();
        assert_eq!(config.initial_play_rate, 1.0);
        assert_eq!(config.max_frame_delta_ms, 1000.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_document_uses_defaults() {
        let config = EngineConfig::from_ron_str("(initial_play_rate: 2.0)").unwrap();
        assert_eq!(config.initial_play_rate, 2.0);
        assert_eq!(config.max_frame_delta_ms, 1000.0);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = EngineConfig::from_ron_str("(initial_play_rate: 0.0)").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(EngineError::InvalidPlayRate(_))));

        let err = EngineConfig::from_ron_str("(max_frame_delta_ms: -1.0)").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(EngineError::InvalidFrameDelta(_))));

        let err = EngineConfig::from_ron_str("(frame_interval_ms: 0.0)").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(EngineError::InvalidFrameInterval(_))));
    }

    #[test]
    fn test_malformed_document() {
        let err = EngineConfig::from_ron_str("(initial_play_rate: ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("timeline_engine_config_{}.ron", std::process::id()));
        let config = EngineConfig {
            initial_play_rate: 0.5,
            ..Default::default()
        };
        config.save(&path).unwrap();
        let loaded = EngineConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
        std::fs::remove_file(&path).unwrap();

        let err = EngineConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
