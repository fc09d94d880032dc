//! Normalized localization-response documents.
//!
//! A document is created once by the parsing boundary, is immutable after,
//! and is consumed exactly once by the reconciler. The loose optional keys of
//! the wire format (`placeholder_id` vs `id`, missing frame tags) are decided
//! at that boundary, so everything downstream sees exactly one shape.

use serde::{Deserialize, Serialize};

use crate::core::types::{Frame, Pose};

/// A detected point of interest with a stable id and a pose in some frame.
///
/// Ids are unique within one reconstruction. Once an id has been emitted into
/// a deduplicated output set, later occurrences contribute nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceholderObject {
    pub id: String,
    pub pose: Pose,
}

/// One parsed localization response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDocument {
    /// Pose of the camera that took the localized image
    pub camera_pose: Pose,
    /// Detected objects, in response order
    pub objects: Vec<PlaceholderObject>,
    /// Frame the document was captured in
    pub source_frame: Frame,
    /// Reconstruction the document localized against, when reported
    pub reconstruction_id: Option<String>,
}

impl SceneDocument {
    pub fn new(camera_pose: Pose, objects: Vec<PlaceholderObject>, source_frame: Frame) -> Self {
        Self {
            camera_pose,
            objects,
            source_frame,
            reconstruction_id: None,
        }
    }
}
