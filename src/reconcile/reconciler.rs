//! Per-document frame reconciliation.
//!
//! A pure mapping from one document to the same document expressed in the
//! target frame. Origin selection is a sequence-level policy owned by the
//! assembler; this module only ever consumes an origin, it never invents one.

use crate::core::types::{Frame, SequenceOrigin};
use crate::pose::transform::transform_pose;
use crate::reconcile::metadata::ReconstructionMetadata;
use crate::scene::document::{PlaceholderObject, SceneDocument};
use crate::validation::data::validate_pose;
use crate::validation::error::ReconcileResult;

/// Express every pose of `document` in `target`.
///
/// Idempotent: reconciling an already-reconciled document with the same
/// target frame is a no-op. Deduplication is not performed here.
pub fn reconcile(
    document: &SceneDocument,
    target: Frame,
    metadata: &ReconstructionMetadata,
    origin: Option<&SequenceOrigin>,
) -> ReconcileResult<SceneDocument> {
    metadata.validate()?;

    validate_pose(&document.camera_pose, "camera")?;
    let camera_pose = transform_pose(&document.camera_pose, target, metadata, origin)?;

    let mut objects = Vec::with_capacity(document.objects.len());
    for object in &document.objects {
        let context = format!("placeholder {}", object.id);
        validate_pose(&object.pose, &context)?;
        objects.push(PlaceholderObject {
            id: object.id.clone(),
            pose: transform_pose(&object.pose, target, metadata, origin)?,
        });
    }

    Ok(SceneDocument {
        camera_pose,
        objects,
        source_frame: target,
        reconstruction_id: document.reconstruction_id.clone(),
    })
}
