//! Localization frame reconciliation
//!
//! Ingests localization responses (camera poses and detected placeholder
//! objects) expressed in geodetic, ECEF, ENU, or reconstruction-local frames
//! and reconciles them into a single consistent coordinate frame for
//! downstream visualization, comparison, and export.

pub mod core;
pub mod geodesy;
pub mod pose;
pub mod reconcile;
pub mod scene;
pub mod utils;
pub mod validation;

// Re-export commonly used types
pub use crate::core::{EcefVector, EnuVector, Frame, GeodeticCoordinate, Pose, SequenceOrigin};
pub use crate::geodesy::{
    ecef_to_enu, ecef_to_geodetic, enu_to_ecef, geodetic_to_ecef, geodetic_to_enu,
};
pub use crate::pose::{transform_point, transform_pose};
pub use crate::reconcile::{
    reconcile, Geopose, MetadataCache, PointCloud, ReconstructionMetadata, SceneGraph,
    SequenceAssembler,
};
pub use crate::scene::{DocumentParser, ParseError, PlaceholderObject, SceneDocument};
pub use crate::utils::{ConfigError, ReconcilerConfig};
pub use crate::validation::{ReconcileError, ReconcileResult};
