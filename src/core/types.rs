//! Core data types for the frame reconciliation pipeline

use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Position on the WGS-84 ellipsoid in decimal degrees and meters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeodeticCoordinate {
    /// Latitude in decimal degrees, valid range [-90, 90]
    pub latitude_deg: f64,
    /// Longitude in decimal degrees, valid range [-180, 180]
    pub longitude_deg: f64,
    /// Height above the ellipsoid in meters
    pub height_m: f64,
}

impl GeodeticCoordinate {
    pub fn new(latitude_deg: f64, longitude_deg: f64, height_m: f64) -> Self {
        Self {
            latitude_deg,
            longitude_deg,
            height_m,
        }
    }

    /// True when latitude and longitude are finite and within the valid ranges
    pub fn is_valid(&self) -> bool {
        self.latitude_deg.is_finite()
            && self.longitude_deg.is_finite()
            && self.height_m.is_finite()
            && (-90.0..=90.0).contains(&self.latitude_deg)
            && (-180.0..=180.0).contains(&self.longitude_deg)
    }
}

/// Earth-Centered-Earth-Fixed Cartesian position in meters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EcefVector(pub Vector3<f64>);

impl EcefVector {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self(Vector3::new(x, y, z))
    }

    pub fn as_vector(&self) -> &Vector3<f64> {
        &self.0
    }
}

/// East-North-Up position in meters relative to a chosen local origin
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnuVector {
    pub east_m: f64,
    pub north_m: f64,
    pub up_m: f64,
}

impl EnuVector {
    pub fn new(east_m: f64, north_m: f64, up_m: f64) -> Self {
        Self {
            east_m,
            north_m,
            up_m,
        }
    }

    pub fn to_vector(self) -> Vector3<f64> {
        Vector3::new(self.east_m, self.north_m, self.up_m)
    }

    pub fn from_vector(v: Vector3<f64>) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

/// Coordinate frames a pose can be expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frame {
    /// Reconstruction-local Cartesian frame
    Local,
    /// Earth-Centered-Earth-Fixed frame
    Ecef,
    /// East-North-Up local tangent plane
    Enu,
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frame::Local => write!(f, "local"),
            Frame::Ecef => write!(f, "ecef"),
            Frame::Enu => write!(f, "enu"),
        }
    }
}

/// Shared origin a multi-document sequence is anchored to.
///
/// Derived once from the first document of a sequence and reused for every
/// later document so the whole sequence shares one tangent plane (ENU) or one
/// re-centering offset (ECEF) instead of each document re-centering itself.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SequenceOrigin {
    /// Geodetic anchor of the local tangent plane
    Enu(GeodeticCoordinate),
    /// Offset added to ECEF output, the negated first-camera ECEF position
    Ecef(EcefVector),
}

/// Position and orientation tagged with the frame they are expressed in.
///
/// The frame tag states which frame `position` lives in; a tag that does not
/// match the data it was built from is a programming error, not a runtime
/// condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vector3<f64>,
    pub orientation: UnitQuaternion<f64>,
    pub frame: Frame,
}

impl Pose {
    pub fn new(position: Vector3<f64>, orientation: UnitQuaternion<f64>, frame: Frame) -> Self {
        Self {
            position,
            orientation,
            frame,
        }
    }

    /// Identity pose at the origin of the given frame
    pub fn identity(frame: Frame) -> Self {
        Self {
            position: Vector3::zeros(),
            orientation: UnitQuaternion::identity(),
            frame,
        }
    }

    /// True when every position and orientation component is finite
    pub fn is_finite(&self) -> bool {
        self.position.iter().all(|c| c.is_finite())
            && self.orientation.coords.iter().all(|c| c.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geodetic_validity_ranges() {
        assert!(GeodeticCoordinate::new(45.0, 10.0, 100.0).is_valid());
        assert!(GeodeticCoordinate::new(90.0, 180.0, 0.0).is_valid());
        assert!(GeodeticCoordinate::new(-90.0, -180.0, 0.0).is_valid());
        assert!(!GeodeticCoordinate::new(90.5, 0.0, 0.0).is_valid());
        assert!(!GeodeticCoordinate::new(0.0, 181.0, 0.0).is_valid());
        assert!(!GeodeticCoordinate::new(f64::NAN, 0.0, 0.0).is_valid());
    }

    #[test]
    fn test_pose_finiteness() {
        let pose = Pose::identity(Frame::Local);
        assert!(pose.is_finite());

        let bad = Pose::new(
            Vector3::new(1.0, f64::INFINITY, 0.0),
            UnitQuaternion::identity(),
            Frame::Local,
        );
        assert!(!bad.is_finite());
    }

    #[test]
    fn test_frame_serde_tags() {
        assert_eq!(serde_json::to_string(&Frame::Enu).unwrap(), "\"enu\"");
        let frame: Frame = serde_json::from_str("\"ecef\"").unwrap();
        assert_eq!(frame, Frame::Ecef);
    }
}
