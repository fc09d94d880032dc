//! Validators applied at the parsing boundary and before every transform.
//!
//! A malformed pose is rejected, never coerced to a default: a defaulted pose
//! would silently corrupt the shared-origin computation for the whole
//! sequence.

use crate::core::types::{GeodeticCoordinate, Pose};
use crate::validation::error::{ReconcileError, ReconcileResult};

/// Reject a pose whose position or orientation contains NaN/Inf.
///
/// `context` names the owner of the pose (camera, placeholder id) so the
/// error pinpoints the offending entry.
pub fn validate_pose(pose: &Pose, context: &str) -> ReconcileResult<()> {
    if !pose.position.iter().all(|c| c.is_finite()) {
        return Err(ReconcileError::MalformedPose {
            context: context.to_string(),
            detail: format!(
                "position is not finite: ({}, {}, {})",
                pose.position.x, pose.position.y, pose.position.z
            ),
        });
    }
    if !pose.orientation.coords.iter().all(|c| c.is_finite()) {
        return Err(ReconcileError::MalformedPose {
            context: context.to_string(),
            detail: "orientation quaternion is not finite".to_string(),
        });
    }
    Ok(())
}

/// Reject latitude/longitude outside the valid domain.
///
/// Belongs to the document-parsing boundary; the geodesy functions themselves
/// are total over valid inputs.
pub fn validate_coordinate(coordinate: &GeodeticCoordinate) -> ReconcileResult<()> {
    if !coordinate.latitude_deg.is_finite() || !(-90.0..=90.0).contains(&coordinate.latitude_deg) {
        return Err(ReconcileError::InvalidCoordinate {
            field: "latitude".to_string(),
            value: coordinate.latitude_deg,
        });
    }
    if !coordinate.longitude_deg.is_finite()
        || !(-180.0..=180.0).contains(&coordinate.longitude_deg)
    {
        return Err(ReconcileError::InvalidCoordinate {
            field: "longitude".to_string(),
            value: coordinate.longitude_deg,
        });
    }
    if !coordinate.height_m.is_finite() {
        return Err(ReconcileError::InvalidCoordinate {
            field: "height".to_string(),
            value: coordinate.height_m,
        });
    }
    Ok(())
}
