pub mod assembler;
pub mod metadata;
pub mod reconciler;

pub use assembler::{DocumentFailure, PointCloud, SceneGraph, SequenceAssembler};
pub use metadata::{Geopose, MetadataCache, ReconstructionMetadata};
pub use reconciler::reconcile;
