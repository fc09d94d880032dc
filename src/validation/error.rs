use crate::core::types::Frame;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Result type for reconciliation operations
pub type ReconcileResult<T> = Result<T, ReconcileError>;

/// Errors raised while reconciling documents into a target frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ReconcileError {
    /// The requested transform needs metadata that is absent
    InvalidFrameCombination {
        source: Frame,
        target: Frame,
        missing: String,
    },
    /// A position contains NaN/Inf or an orientation is not finite
    MalformedPose { context: String, detail: String },
    /// Latitude or longitude outside the valid domain
    InvalidCoordinate { field: String, value: f64 },
    /// Reconstruction metadata violates its own contract (e.g. scale <= 0)
    InvalidMetadata { parameter: String, value: String },
}

impl fmt::Display for ReconcileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconcileError::InvalidFrameCombination {
                source,
                target,
                missing,
            } => write!(
                f,
                "cannot transform {} -> {}: missing {}",
                source, target, missing
            ),
            ReconcileError::MalformedPose { context, detail } => {
                write!(f, "malformed pose in {}: {}", context, detail)
            }
            ReconcileError::InvalidCoordinate { field, value } => {
                write!(f, "coordinate {} out of range: {}", field, value)
            }
            ReconcileError::InvalidMetadata { parameter, value } => {
                write!(f, "invalid reconstruction metadata {}: {}", parameter, value)
            }
        }
    }
}

impl std::error::Error for ReconcileError {}
