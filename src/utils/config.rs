use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

use crate::core::types::Frame;

/// Configuration for one reconciliation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconcilerConfig {
    /// Frame every document and the cloud are reconciled into
    pub target_frame: Frame,
    /// Abort the whole sequence on the first failing document instead of
    /// skipping it
    pub halt_on_document_error: bool,
    /// Print a diagnostic line when duplicate object ids are skipped
    pub report_duplicates: bool,
    /// Voxel size applied by the downstream viewer, carried through for the
    /// export sidecar
    pub voxel_size_m: f64,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            target_frame: Frame::Enu,
            halt_on_document_error: false,
            report_duplicates: true,
            voxel_size_m: 0.02,
        }
    }
}

/// Errors raised while loading or validating configuration
#[derive(Debug)]
pub enum ConfigError {
    Io { path: String, details: String },
    Format { details: String },
    InvalidValue { parameter: String, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, details } => {
                write!(f, "cannot read config {}: {}", path, details)
            }
            ConfigError::Format { details } => write!(f, "malformed config: {}", details),
            ConfigError::InvalidValue { parameter, value } => {
                write!(f, "invalid config value for {}: {}", parameter, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl ReconcilerConfig {
    /// Load and validate a configuration from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|err| ConfigError::Io {
            path: path.display().to_string(),
            details: err.to_string(),
        })?;
        let config: ReconcilerConfig =
            serde_json::from_str(&content).map_err(|err| ConfigError::Format {
                details: err.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Write the configuration as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(self).map_err(|err| ConfigError::Format {
            details: err.to_string(),
        })?;
        fs::write(path, content).map_err(|err| ConfigError::Io {
            path: path.display().to_string(),
            details: err.to_string(),
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.voxel_size_m.is_finite() || self.voxel_size_m <= 0.0 {
            return Err(ConfigError::InvalidValue {
                parameter: "voxel_size_m".to_string(),
                value: self.voxel_size_m.to_string(),
            });
        }
        Ok(())
    }
}
