//! Folds an ordered sequence of documents into one scene graph.
//!
//! The shared origin is determined once, from the first document that
//! reconciles, and reused for every later document. That is what keeps a
//! multi-shot sequence visually coherent instead of each frame re-centering
//! itself.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::core::types::{EcefVector, Frame, SequenceOrigin};
use crate::pose::transform::transform_point;
use crate::reconcile::metadata::ReconstructionMetadata;
use crate::reconcile::reconciler::reconcile;
use crate::scene::document::{PlaceholderObject, SceneDocument};
use crate::validation::error::{ReconcileError, ReconcileResult};

/// Point-cloud payload with the frame its points are expressed in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointCloud {
    pub points: Vec<Vector3<f64>>,
    pub frame: Frame,
}

/// A document the assembler skipped, with the reason
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentFailure {
    /// Index of the document in the input sequence
    pub index: usize,
    pub error: ReconcileError,
}

/// Assembled output scene, everything expressed in one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneGraph {
    /// Frame every position below is expressed in
    pub frame: Frame,
    /// Transformed cloud payload, when one was supplied
    pub cloud: Option<PointCloud>,
    /// Camera centers, one per reconciled document, in input order
    pub camera_path: Vec<Vector3<f64>>,
    /// Deduplicated object markers, first occurrence wins by id
    pub object_markers: Vec<PlaceholderObject>,
    /// Diagnostic count of duplicate object ids that were skipped
    pub skipped_duplicates: usize,
    /// Documents that failed to reconcile under the skip policy
    pub skipped_documents: Vec<DocumentFailure>,
}

/// Folds reconciled documents into a [`SceneGraph`].
///
/// Owns the seen-id set for exactly one `assemble` call, so independent
/// sequences never interfere with each other.
#[derive(Debug, Clone)]
pub struct SequenceAssembler {
    target_frame: Frame,
    /// When true the first failing document aborts the whole sequence;
    /// when false it is recorded and skipped
    halt_on_document_error: bool,
}

impl SequenceAssembler {
    pub fn new(target_frame: Frame) -> Self {
        Self {
            target_frame,
            halt_on_document_error: false,
        }
    }

    pub fn halt_on_document_error(mut self, halt: bool) -> Self {
        self.halt_on_document_error = halt;
        self
    }

    pub fn target_frame(&self) -> Frame {
        self.target_frame
    }

    /// Derive the sequence origin for the ENU target up front; the ECEF
    /// origin needs a reconciled camera and is derived lazily in the walk.
    fn initial_origin(&self, metadata: &ReconstructionMetadata) -> Option<SequenceOrigin> {
        match self.target_frame {
            Frame::Enu => metadata
                .origin_geopose
                .as_ref()
                .map(|g| g.position)
                .or(metadata.gps)
                .map(SequenceOrigin::Enu),
            _ => None,
        }
    }

    /// Fold `documents` in input order into a scene graph in the target frame
    pub fn assemble(
        &self,
        documents: &[SceneDocument],
        metadata: &ReconstructionMetadata,
        cloud: Option<&PointCloud>,
    ) -> ReconcileResult<SceneGraph> {
        metadata.validate()?;

        let mut origin = self.initial_origin(metadata);
        let mut camera_path = Vec::with_capacity(documents.len());
        let mut object_markers: Vec<PlaceholderObject> = Vec::new();
        let mut seen_ids: HashSet<String> = HashSet::new();
        let mut skipped_duplicates = 0usize;
        let mut skipped_documents = Vec::new();

        for (index, document) in documents.iter().enumerate() {
            // The ECEF origin is the negated position of the first camera
            // that reconciles; everything after is re-centered by it.
            if self.target_frame == Frame::Ecef && origin.is_none() {
                match reconcile(document, Frame::Ecef, metadata, None) {
                    Ok(first) => {
                        origin = Some(SequenceOrigin::Ecef(EcefVector(
                            -first.camera_pose.position,
                        )));
                    }
                    Err(error) => {
                        if self.halt_on_document_error {
                            return Err(error);
                        }
                        skipped_documents.push(DocumentFailure { index, error });
                        continue;
                    }
                }
            }

            let reconciled = match reconcile(document, self.target_frame, metadata, origin.as_ref())
            {
                Ok(reconciled) => reconciled,
                Err(error) => {
                    if self.halt_on_document_error {
                        return Err(error);
                    }
                    skipped_documents.push(DocumentFailure { index, error });
                    continue;
                }
            };

            camera_path.push(reconciled.camera_pose.position);

            for object in reconciled.objects {
                if seen_ids.insert(object.id.clone()) {
                    object_markers.push(object);
                } else {
                    skipped_duplicates += 1;
                }
            }
        }

        let cloud = cloud
            .map(|cloud| self.transform_cloud(cloud, metadata, origin.as_ref()))
            .transpose()?;

        Ok(SceneGraph {
            frame: self.target_frame,
            cloud,
            camera_path,
            object_markers,
            skipped_duplicates,
            skipped_documents,
        })
    }

    /// Transform the cloud with the same origin/scale/transform as the poses
    fn transform_cloud(
        &self,
        cloud: &PointCloud,
        metadata: &ReconstructionMetadata,
        origin: Option<&SequenceOrigin>,
    ) -> ReconcileResult<PointCloud> {
        let mut points = Vec::with_capacity(cloud.points.len());
        for point in &cloud.points {
            points.push(transform_point(
                *point,
                cloud.frame,
                self.target_frame,
                metadata,
                origin,
            )?);
        }
        Ok(PointCloud {
            points,
            frame: self.target_frame,
        })
    }
}
