//! Per-reconstruction metadata and its lookup cache.
//!
//! Metadata is produced once per reconstruction id by an external lookup
//! (`get_reconstructions_json` on the localizer service). The cache keeps
//! repeated lookups for the same id from re-deriving anything within one run;
//! it is owned by the caller and never shared across sequences.

use nalgebra::{Matrix4, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::core::types::GeodeticCoordinate;
use crate::validation::data::validate_coordinate;
use crate::validation::error::{ReconcileError, ReconcileResult};

/// Geodetic position paired with an orientation quaternion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geopose {
    pub position: GeodeticCoordinate,
    pub orientation: UnitQuaternion<f64>,
}

/// Everything a reconstruction exports about its own frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconstructionMetadata {
    /// Scale from reconstruction-local units to meters, must be > 0
    pub scale: f64,
    /// Row-major rigid+scale 4x4 taking local homogeneous columns to ECEF
    pub ecef_transform: Option<Matrix4<f64>>,
    /// Geopose of the reconstruction origin, anchors the ENU tangent plane
    pub origin_geopose: Option<Geopose>,
    /// GPS fix the reconstruction was captured at
    pub gps: Option<GeodeticCoordinate>,
    /// Azimuth of the reconstruction's reference heading in degrees
    pub azimuth_deg: f64,
    /// Gravity direction in the reconstruction-local frame
    pub gravity: Vector3<f64>,
}

impl Default for ReconstructionMetadata {
    fn default() -> Self {
        Self {
            scale: 1.0,
            ecef_transform: None,
            origin_geopose: None,
            gps: None,
            azimuth_deg: 0.0,
            gravity: Vector3::new(0.0, -1.0, 0.0),
        }
    }
}

impl ReconstructionMetadata {
    /// Check the metadata contract before it is used for a reconciliation pass
    pub fn validate(&self) -> ReconcileResult<()> {
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(ReconcileError::InvalidMetadata {
                parameter: "scale".to_string(),
                value: self.scale.to_string(),
            });
        }
        if let Some(geopose) = &self.origin_geopose {
            validate_coordinate(&geopose.position)?;
        }
        if let Some(gps) = &self.gps {
            validate_coordinate(gps)?;
        }
        Ok(())
    }
}

/// Cache of reconstruction metadata keyed by reconstruction id.
///
/// Owned by the caller for the duration of one run. Hit/miss statistics are
/// kept so a driver can report whether the external lookup was actually
/// avoided.
#[derive(Debug, Default)]
pub struct MetadataCache {
    entries: HashMap<String, ReconstructionMetadata>,
    hit_count: usize,
    miss_count: usize,
}

impl MetadataCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up cached metadata for a reconstruction id
    pub fn get(&mut self, reconstruction_id: &str) -> Option<&ReconstructionMetadata> {
        if self.entries.contains_key(reconstruction_id) {
            self.hit_count += 1;
            self.entries.get(reconstruction_id)
        } else {
            self.miss_count += 1;
            None
        }
    }

    /// Store metadata for a reconstruction id
    pub fn insert(&mut self, reconstruction_id: impl Into<String>, metadata: ReconstructionMetadata) {
        self.entries.insert(reconstruction_id.into(), metadata);
    }

    /// Return cached metadata, calling `resolve` at most once on a miss
    pub fn get_or_fetch<E>(
        &mut self,
        reconstruction_id: &str,
        resolve: impl FnOnce(&str) -> Result<ReconstructionMetadata, E>,
    ) -> Result<&ReconstructionMetadata, E> {
        match self.entries.entry(reconstruction_id.to_string()) {
            std::collections::hash_map::Entry::Occupied(entry) => {
                self.hit_count += 1;
                Ok(entry.into_mut())
            }
            std::collections::hash_map::Entry::Vacant(slot) => {
                self.miss_count += 1;
                Ok(slot.insert(resolve(reconstruction_id)?))
            }
        }
    }

    /// (hits, misses, hit rate)
    pub fn statistics(&self) -> (usize, usize, f64) {
        let total = self.hit_count + self.miss_count;
        let hit_rate = if total > 0 {
            self.hit_count as f64 / total as f64
        } else {
            0.0
        };
        (self.hit_count, self.miss_count, hit_rate)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
