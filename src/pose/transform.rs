//! Frame-aware pose and point transforms.
//!
//! Orientation convention used on every path: the frame rotation is applied
//! in world space, pre-multiplied, `q_out = q_frame * q_in`. Mixing orders
//! across the LOCAL/ECEF/ENU paths produces scenes that look almost right but
//! mirrored or rotated, so the convention is fixed here and checked against
//! reference poses in the tests.

use nalgebra::{Matrix3, Rotation3, UnitQuaternion, Vector3, Vector4};
use std::f64::consts::FRAC_PI_2;

use crate::core::types::{EcefVector, EnuVector, Frame, GeodeticCoordinate, Pose, SequenceOrigin};
use crate::geodesy::wgs84::{ecef_to_enu, enu_rotation, enu_to_ecef, geodetic_to_enu};
use crate::reconcile::metadata::ReconstructionMetadata;
use crate::validation::error::{ReconcileError, ReconcileResult};

/// Fixed correction mapping the reconstruction's up convention onto ENU up:
/// a -90 degree rotation about the east axis.
fn up_correction() -> UnitQuaternion<f64> {
    UnitQuaternion::from_axis_angle(&Vector3::x_axis(), -FRAC_PI_2)
}

/// ENU rotation at `origin` as a quaternion, for orientation composition
fn enu_rotation_quaternion(origin: &GeodeticCoordinate) -> UnitQuaternion<f64> {
    UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(enu_rotation(origin)))
}

/// Split the 4x4 local-to-ECEF transform into (scale, rotation, translation)
fn decompose_ecef_transform(
    matrix: &nalgebra::Matrix4<f64>,
) -> ReconcileResult<(f64, UnitQuaternion<f64>, Vector3<f64>)> {
    let linear: Matrix3<f64> = matrix.fixed_view::<3, 3>(0, 0).into_owned();
    let scale = linear.column(0).norm();
    if !scale.is_finite() || scale <= 0.0 {
        return Err(ReconcileError::InvalidMetadata {
            parameter: "ecef_transform".to_string(),
            value: format!("degenerate linear part, column norm {}", scale),
        });
    }
    let rotation =
        UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(linear / scale));
    let translation = matrix.fixed_view::<3, 1>(0, 3).into_owned();
    Ok((scale, rotation, translation))
}

/// Resolve the geodetic anchor a conversion through the ENU tangent plane
/// should use: the sequence origin when the caller supplied one, the
/// reconstruction's own origin geopose otherwise.
///
/// An ECEF sequence origin handed to an ENU-target conversion is a caller
/// bug and is rejected instead of silently anchoring to the wrong plane.
/// For an ECEF target the ECEF origin is a re-centering offset, not an
/// anchor, so the anchor falls back to the metadata geopose there.
fn resolve_enu_anchor<'a>(
    metadata: &'a ReconstructionMetadata,
    origin: Option<&'a SequenceOrigin>,
    source: Frame,
    target: Frame,
) -> ReconcileResult<Option<&'a GeodeticCoordinate>> {
    match origin {
        Some(SequenceOrigin::Enu(coordinate)) => Ok(Some(coordinate)),
        Some(SequenceOrigin::Ecef(_)) if target == Frame::Enu => {
            Err(ReconcileError::InvalidFrameCombination {
                source,
                target,
                missing: "enu sequence origin (got an ecef re-centering origin)".to_string(),
            })
        }
        _ => Ok(metadata.origin_geopose.as_ref().map(|g| &g.position)),
    }
}

/// Re-centering offset for ECEF output, when the sequence carries one
fn ecef_offset(origin: Option<&SequenceOrigin>) -> Option<Vector3<f64>> {
    match origin {
        Some(SequenceOrigin::Ecef(offset)) => Some(offset.0),
        _ => None,
    }
}

/// Transform a pose into `target`, using `pose.frame` as the source.
///
/// Returns the input unchanged when source and target match; that identity is
/// a correctness requirement so callers can compose pipelines uniformly.
pub fn transform_pose(
    pose: &Pose,
    target: Frame,
    metadata: &ReconstructionMetadata,
    origin: Option<&SequenceOrigin>,
) -> ReconcileResult<Pose> {
    if pose.frame == target {
        return Ok(pose.clone());
    }

    match (pose.frame, target) {
        (Frame::Local, Frame::Ecef) => {
            let matrix = metadata.ecef_transform.as_ref().ok_or_else(|| {
                ReconcileError::InvalidFrameCombination {
                    source: Frame::Local,
                    target: Frame::Ecef,
                    missing: "ecef_transform".to_string(),
                }
            })?;
            let (_, frame_rotation, _) = decompose_ecef_transform(matrix)?;

            let homogeneous =
                matrix * Vector4::new(pose.position.x, pose.position.y, pose.position.z, 1.0);
            let mut position = homogeneous.xyz();
            if let Some(offset) = ecef_offset(origin) {
                position += offset;
            }

            Ok(Pose::new(
                position,
                frame_rotation * pose.orientation,
                Frame::Ecef,
            ))
        }
        (Frame::Local, Frame::Enu) => {
            let geopose = metadata.origin_geopose.as_ref().ok_or_else(|| {
                ReconcileError::InvalidFrameCombination {
                    source: Frame::Local,
                    target: Frame::Enu,
                    missing: "origin_geopose".to_string(),
                }
            })?;
            let gps = metadata
                .gps
                .as_ref()
                .ok_or_else(|| ReconcileError::InvalidFrameCombination {
                    source: Frame::Local,
                    target: Frame::Enu,
                    missing: "gps".to_string(),
                })?;
            let anchor = resolve_enu_anchor(metadata, origin, Frame::Local, Frame::Enu)?
                .unwrap_or(&geopose.position);

            // scale, up correction, origin orientation, then translation
            let frame_rotation = geopose.orientation * up_correction();
            let position = frame_rotation * (pose.position * metadata.scale)
                + geodetic_to_enu(gps, anchor).to_vector();

            Ok(Pose::new(
                position,
                frame_rotation * pose.orientation,
                Frame::Enu,
            ))
        }
        (Frame::Ecef, Frame::Enu) => {
            let anchor = resolve_enu_anchor(metadata, origin, Frame::Ecef, Frame::Enu)?
                .ok_or_else(|| ReconcileError::InvalidFrameCombination {
                    source: Frame::Ecef,
                    target: Frame::Enu,
                    missing: "enu origin".to_string(),
                })?;
            let position = ecef_to_enu(&EcefVector(pose.position), anchor).to_vector();
            Ok(Pose::new(
                position,
                enu_rotation_quaternion(anchor) * pose.orientation,
                Frame::Enu,
            ))
        }
        (Frame::Enu, Frame::Ecef) => {
            let anchor = resolve_enu_anchor(metadata, origin, Frame::Enu, Frame::Ecef)?
                .ok_or_else(|| ReconcileError::InvalidFrameCombination {
                    source: Frame::Enu,
                    target: Frame::Ecef,
                    missing: "enu origin".to_string(),
                })?;
            // The re-centering offset applies to every path that reaches
            // ECEF, otherwise mixed-source sequences fall apart spatially.
            let mut position = enu_to_ecef(&EnuVector::from_vector(pose.position), anchor).0;
            if let Some(offset) = ecef_offset(origin) {
                position += offset;
            }
            Ok(Pose::new(
                position,
                enu_rotation_quaternion(anchor).inverse() * pose.orientation,
                Frame::Ecef,
            ))
        }
        (source, Frame::Local) => Err(ReconcileError::InvalidFrameCombination {
            source,
            target: Frame::Local,
            missing: "inverse local transform".to_string(),
        }),
        // Same-frame pairs are handled by the identity return above
        (source, target) => Err(ReconcileError::InvalidFrameCombination {
            source,
            target,
            missing: "supported conversion path".to_string(),
        }),
    }
}

/// Transform a bare position through the same pipeline as [`transform_pose`].
///
/// The cloud payload goes through this function with the same per-sequence
/// origin/scale/transform as poses, which is what keeps cloud geometry and
/// camera/object markers spatially consistent.
pub fn transform_point(
    point: Vector3<f64>,
    source: Frame,
    target: Frame,
    metadata: &ReconstructionMetadata,
    origin: Option<&SequenceOrigin>,
) -> ReconcileResult<Vector3<f64>> {
    let pose = Pose::new(point, nalgebra::UnitQuaternion::identity(), source);
    Ok(transform_pose(&pose, target, metadata, origin)?.position)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::metadata::Geopose;
    use nalgebra::Matrix4;

    fn enu_metadata(scale: f64, origin: GeodeticCoordinate) -> ReconstructionMetadata {
        ReconstructionMetadata {
            scale,
            origin_geopose: Some(Geopose {
                position: origin,
                orientation: UnitQuaternion::identity(),
            }),
            gps: Some(origin),
            ..Default::default()
        }
    }

    #[test]
    fn test_identity_transform_returns_input() {
        let pose = Pose::new(
            Vector3::new(1.0, 2.0, 3.0),
            UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 0.7),
            Frame::Enu,
        );
        let metadata = ReconstructionMetadata::default();

        let out = transform_pose(&pose, Frame::Enu, &metadata, None).unwrap();
        assert_eq!(out, pose);
    }

    #[test]
    fn test_local_to_enu_scale_and_up_correction() {
        // Identity origin orientation and gps == anchor leave only the scale
        // and the -90 degree east-axis correction: (x, y, z) -> (x, z, -y).
        let origin = GeodeticCoordinate::new(45.0, 10.0, 100.0);
        let metadata = enu_metadata(2.0, origin);

        let pose = Pose::new(
            Vector3::new(1.0, 2.0, 3.0),
            UnitQuaternion::identity(),
            Frame::Local,
        );
        let out = transform_pose(&pose, Frame::Enu, &metadata, None).unwrap();

        assert!((out.position.x - 2.0).abs() < 1e-9);
        assert!((out.position.y - 6.0).abs() < 1e-9);
        assert!((out.position.z + 4.0).abs() < 1e-9);
        assert_eq!(out.frame, Frame::Enu);
    }

    #[test]
    fn test_orientation_is_premultiplied() {
        let origin = GeodeticCoordinate::new(45.0, 10.0, 100.0);
        let metadata = enu_metadata(1.0, origin);

        let q_in = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), FRAC_PI_2);
        let pose = Pose::new(Vector3::zeros(), q_in, Frame::Local);
        let out = transform_pose(&pose, Frame::Enu, &metadata, None).unwrap();

        let expected = up_correction() * q_in;
        assert!(out.orientation.angle_to(&expected) < 1e-9);
    }

    #[test]
    fn test_local_to_ecef_known_matrix() {
        // Scale 2, rotation 90 degrees about z, translation (10, 20, 30),
        // written row-major.
        #[rustfmt::skip]
        let matrix = Matrix4::new(
            0.0, -2.0, 0.0, 10.0,
            2.0,  0.0, 0.0, 20.0,
            0.0,  0.0, 2.0, 30.0,
            0.0,  0.0, 0.0,  1.0,
        );
        let metadata = ReconstructionMetadata {
            ecef_transform: Some(matrix),
            ..Default::default()
        };

        let pose = Pose::new(
            Vector3::new(1.0, 0.0, 0.0),
            UnitQuaternion::identity(),
            Frame::Local,
        );
        let out = transform_pose(&pose, Frame::Ecef, &metadata, None).unwrap();

        assert!((out.position - Vector3::new(10.0, 22.0, 30.0)).norm() < 1e-9);

        // Orientation picks up only the rotation component, scale divided out
        let rotated_x = out.orientation * Vector3::x_axis().into_inner();
        assert!((rotated_x - Vector3::y_axis().into_inner()).norm() < 1e-9);
    }

    #[test]
    fn test_local_to_ecef_without_transform_fails() {
        let metadata = ReconstructionMetadata::default();
        let pose = Pose::identity(Frame::Local);

        let err = transform_pose(&pose, Frame::Ecef, &metadata, None).unwrap_err();
        match err {
            ReconcileError::InvalidFrameCombination { missing, .. } => {
                assert_eq!(missing, "ecef_transform");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_ecef_enu_round_trip() {
        let origin = GeodeticCoordinate::new(45.0, 10.0, 100.0);
        let sequence_origin = SequenceOrigin::Enu(origin);
        let metadata = ReconstructionMetadata::default();

        let q = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), 0.3);
        let ecef_pose = Pose::new(
            crate::geodesy::wgs84::geodetic_to_ecef(&GeodeticCoordinate::new(45.0005, 10.0005, 120.0)).0,
            q,
            Frame::Ecef,
        );

        let enu = transform_pose(&ecef_pose, Frame::Enu, &metadata, Some(&sequence_origin)).unwrap();
        let back = transform_pose(&enu, Frame::Ecef, &metadata, Some(&sequence_origin)).unwrap();

        assert!((back.position - ecef_pose.position).norm() < 1e-6);
        assert!(back.orientation.angle_to(&ecef_pose.orientation) < 1e-9);
    }

    #[test]
    fn test_enu_target_matches_geodetic_to_enu() {
        let origin = GeodeticCoordinate::new(45.0, 10.0, 100.0);
        let point = GeodeticCoordinate::new(45.0001, 10.0, 100.0);
        let sequence_origin = SequenceOrigin::Enu(origin);
        let metadata = ReconstructionMetadata::default();

        let ecef_pose = Pose::new(
            crate::geodesy::wgs84::geodetic_to_ecef(&point).0,
            UnitQuaternion::identity(),
            Frame::Ecef,
        );
        let out = transform_pose(&ecef_pose, Frame::Enu, &metadata, Some(&sequence_origin)).unwrap();

        assert!(out.position.x.abs() < 0.01);
        assert!((out.position.y - 11.057).abs() < 0.01);
        assert!(out.position.z.abs() < 0.01);
    }

    #[test]
    fn test_enu_to_ecef_applies_recentering_offset() {
        // A re-centered ECEF sequence subtracts the first camera's ECEF
        // position from every output. An ENU-source pose one metre east of
        // the anchor must land near the re-centered origin, not out at
        // Earth-radius magnitude.
        let origin = GeodeticCoordinate::new(45.0, 10.0, 100.0);
        let metadata = enu_metadata(1.0, origin);
        let anchor_ecef = crate::geodesy::wgs84::geodetic_to_ecef(&origin).0;
        let sequence_origin = SequenceOrigin::Ecef(EcefVector(-anchor_ecef));

        let pose = Pose::new(
            Vector3::new(1.0, 0.0, 0.0),
            UnitQuaternion::identity(),
            Frame::Enu,
        );
        let out = transform_pose(&pose, Frame::Ecef, &metadata, Some(&sequence_origin)).unwrap();

        assert_eq!(out.frame, Frame::Ecef);
        assert!(out.position.norm() < 2.0, "position {:?}", out.position);
        assert!((out.position.norm() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_ecef_origin_rejected_for_enu_target() {
        let origin = GeodeticCoordinate::new(45.0, 10.0, 100.0);
        let anchor_ecef = crate::geodesy::wgs84::geodetic_to_ecef(&origin).0;
        let sequence_origin = SequenceOrigin::Ecef(EcefVector(-anchor_ecef));
        let metadata = enu_metadata(1.0, origin);

        let pose = Pose::new(anchor_ecef, UnitQuaternion::identity(), Frame::Ecef);
        let err =
            transform_pose(&pose, Frame::Enu, &metadata, Some(&sequence_origin)).unwrap_err();
        match err {
            ReconcileError::InvalidFrameCombination { missing, .. } => {
                assert!(missing.contains("re-centering"), "missing: {}", missing);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_target_local_is_rejected() {
        let metadata = ReconstructionMetadata::default();
        let pose = Pose::identity(Frame::Ecef);

        let err = transform_pose(&pose, Frame::Local, &metadata, None).unwrap_err();
        assert!(matches!(
            err,
            ReconcileError::InvalidFrameCombination { target: Frame::Local, .. }
        ));
    }

    #[test]
    fn test_point_follows_pose_pipeline() {
        let origin = GeodeticCoordinate::new(45.0, 10.0, 100.0);
        let metadata = enu_metadata(3.0, origin);
        let p = Vector3::new(0.5, -1.0, 2.0);

        let from_point = transform_point(p, Frame::Local, Frame::Enu, &metadata, None).unwrap();
        let from_pose = transform_pose(
            &Pose::new(p, UnitQuaternion::identity(), Frame::Local),
            Frame::Enu,
            &metadata,
            None,
        )
        .unwrap();

        assert!((from_point - from_pose.position).norm() < 1e-12);
    }
}
