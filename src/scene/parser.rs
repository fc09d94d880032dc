//! Parsing boundary between raw localizer responses and the normalized
//! document model.
//!
//! The wire format is loose: placeholder ids arrive as `placeholder_id` or
//! `id`, as numbers or strings, and the frame tag may be absent. All of that
//! is normalized here so the reconciliation core only ever sees one
//! [`SceneDocument`] shape.

use nalgebra::{Matrix4, Quaternion, UnitQuaternion, Vector3};
use serde::Deserialize;
use std::fmt;

use crate::core::types::{Frame, GeodeticCoordinate, Pose};
use crate::reconcile::metadata::{Geopose, ReconstructionMetadata};
use crate::scene::document::{PlaceholderObject, SceneDocument};
use crate::validation::data::{validate_coordinate, validate_pose};
use crate::validation::error::ReconcileError;

/// Errors raised while decoding a response document
#[derive(Debug)]
pub enum ParseError {
    /// The payload is not the expected JSON shape
    Json { details: String },
    /// The payload decoded but violates a document contract
    Invalid(ReconcileError),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Json { details } => write!(f, "malformed response document: {}", details),
            ParseError::Invalid(err) => write!(f, "invalid response document: {}", err),
        }
    }
}

impl std::error::Error for ParseError {}

impl From<serde_json::Error> for ParseError {
    fn from(err: serde_json::Error) -> Self {
        ParseError::Json {
            details: err.to_string(),
        }
    }
}

impl From<ReconcileError> for ParseError {
    fn from(err: ReconcileError) -> Self {
        ParseError::Invalid(err)
    }
}

#[derive(Debug, Deserialize)]
struct PositionEntry {
    x: f64,
    y: f64,
    z: f64,
}

#[derive(Debug, Deserialize)]
struct OrientationEntry {
    w: f64,
    x: f64,
    y: f64,
    z: f64,
}

#[derive(Debug, Deserialize)]
struct PoseEntry {
    position: PositionEntry,
    orientation: OrientationEntry,
}

#[derive(Debug, Deserialize)]
struct CameraEntry {
    pose: PoseEntry,
}

/// Ids arrive as numbers or strings depending on the service version
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum IdEntry {
    Number(i64),
    Text(String),
}

impl IdEntry {
    fn into_string(self) -> String {
        match self {
            IdEntry::Number(n) => n.to_string(),
            IdEntry::Text(s) => s,
        }
    }
}

#[derive(Debug, Deserialize)]
struct PlaceholderEntry {
    #[serde(rename = "placeholder_id", alias = "id")]
    id: IdEntry,
    pose: PoseEntry,
}

#[derive(Debug, Deserialize)]
struct ResponseEntry {
    camera: CameraEntry,
    #[serde(default)]
    placeholders: Vec<PlaceholderEntry>,
    #[serde(default)]
    reconstruction_id: Option<IdEntry>,
    #[serde(default)]
    coordinate_system: Option<Frame>,
}

#[derive(Debug, Deserialize)]
struct GeodeticEntry {
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    altitude: f64,
}

impl GeodeticEntry {
    fn to_coordinate(&self) -> GeodeticCoordinate {
        GeodeticCoordinate::new(self.latitude, self.longitude, self.altitude)
    }
}

#[derive(Debug, Deserialize)]
struct GeoposeEntry {
    position: GeodeticEntry,
    orientation: OrientationEntry,
}

#[derive(Debug, Deserialize)]
struct MetadataEntry {
    scale: f64,
    #[serde(default)]
    ecef_transform: Option<[[f64; 4]; 4]>,
    #[serde(default)]
    origin_geopose: Option<GeoposeEntry>,
    #[serde(default)]
    gps: Option<GeodeticEntry>,
    #[serde(default)]
    azimuth: f64,
    #[serde(default)]
    gravity: Option<[f64; 3]>,
}

fn build_pose(entry: &PoseEntry, frame: Frame, context: &str) -> Result<Pose, ParseError> {
    let raw = Quaternion::new(
        entry.orientation.w,
        entry.orientation.x,
        entry.orientation.y,
        entry.orientation.z,
    );
    if !raw.coords.iter().all(|c| c.is_finite()) || raw.norm() < 1e-12 {
        return Err(ReconcileError::MalformedPose {
            context: context.to_string(),
            detail: "orientation quaternion is not finite or has zero norm".to_string(),
        }
        .into());
    }

    let pose = Pose::new(
        Vector3::new(entry.position.x, entry.position.y, entry.position.z),
        UnitQuaternion::from_quaternion(raw),
        frame,
    );
    validate_pose(&pose, context)?;
    Ok(pose)
}

/// Decoder for localizer responses and reconstruction metadata
#[derive(Debug, Clone)]
pub struct DocumentParser {
    /// Frame assumed when a response carries no coordinate-system tag
    default_frame: Frame,
}

impl Default for DocumentParser {
    fn default() -> Self {
        Self {
            default_frame: Frame::Local,
        }
    }
}

impl DocumentParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_frame(default_frame: Frame) -> Self {
        Self { default_frame }
    }

    /// Decode one localize response into a normalized document
    pub fn parse_document(&self, payload: &str) -> Result<SceneDocument, ParseError> {
        let entry: ResponseEntry = serde_json::from_str(payload)?;
        let source_frame = entry.coordinate_system.unwrap_or(self.default_frame);

        let camera_pose = build_pose(&entry.camera.pose, source_frame, "camera")?;

        let mut objects = Vec::with_capacity(entry.placeholders.len());
        for placeholder in entry.placeholders {
            let id = placeholder.id.into_string();
            let context = format!("placeholder {}", id);
            let pose = build_pose(&placeholder.pose, source_frame, &context)?;
            objects.push(PlaceholderObject { id, pose });
        }

        Ok(SceneDocument {
            camera_pose,
            objects,
            source_frame,
            reconstruction_id: entry.reconstruction_id.map(IdEntry::into_string),
        })
    }

    /// Decode a reconstruction-metadata payload
    pub fn parse_metadata(&self, payload: &str) -> Result<ReconstructionMetadata, ParseError> {
        let entry: MetadataEntry = serde_json::from_str(payload)?;

        let origin_geopose = entry
            .origin_geopose
            .map(|geopose| -> Result<Geopose, ParseError> {
                let position = geopose.position.to_coordinate();
                validate_coordinate(&position)?;
                let raw = Quaternion::new(
                    geopose.orientation.w,
                    geopose.orientation.x,
                    geopose.orientation.y,
                    geopose.orientation.z,
                );
                if !raw.coords.iter().all(|c| c.is_finite()) || raw.norm() < 1e-12 {
                    return Err(ReconcileError::MalformedPose {
                        context: "origin_geopose".to_string(),
                        detail: "orientation quaternion is not finite or has zero norm"
                            .to_string(),
                    }
                    .into());
                }
                Ok(Geopose {
                    position,
                    orientation: UnitQuaternion::from_quaternion(raw),
                })
            })
            .transpose()?;

        let gps = entry
            .gps
            .map(|gps| -> Result<GeodeticCoordinate, ParseError> {
                let coordinate = gps.to_coordinate();
                validate_coordinate(&coordinate)?;
                Ok(coordinate)
            })
            .transpose()?;

        let metadata = ReconstructionMetadata {
            scale: entry.scale,
            ecef_transform: entry.ecef_transform.map(|rows| {
                Matrix4::from_fn(|r, c| rows[r][c])
            }),
            origin_geopose,
            gps,
            azimuth_deg: entry.azimuth,
            gravity: entry
                .gravity
                .map(|g| Vector3::new(g[0], g[1], g[2]))
                .unwrap_or_else(|| Vector3::new(0.0, -1.0, 0.0)),
        };
        metadata.validate()?;
        Ok(metadata)
    }
}
