//! WGS-84 geodetic conversions between geodetic, ECEF, and ENU frames.
//!
//! All functions are pure and total over the valid input domain: latitude
//! [-90, 90] and longitude [-180, 180] in decimal degrees. Range checks
//! belong to the document-parsing boundary, not here.

use nalgebra::{Matrix3, Vector3};

use crate::core::constants::{
    WGS84_ECCENTRICITY_SQUARED, WGS84_SEMI_MAJOR_AXIS, WGS84_SEMI_MINOR_AXIS,
};
use crate::core::types::{EcefVector, EnuVector, GeodeticCoordinate};

/// Prime-vertical radius of curvature N(lat) = a / sqrt(1 - e^2 * sin^2(lat)).
///
/// Finite for every valid latitude, including the poles.
fn prime_vertical_radius(lat_rad: f64) -> f64 {
    WGS84_SEMI_MAJOR_AXIS / (1.0 - WGS84_ECCENTRICITY_SQUARED * lat_rad.sin().powi(2)).sqrt()
}

/// Convert a geodetic coordinate to ECEF using the closed-form expression
pub fn geodetic_to_ecef(position: &GeodeticCoordinate) -> EcefVector {
    let lat_rad = position.latitude_deg.to_radians();
    let lon_rad = position.longitude_deg.to_radians();
    let height = position.height_m;

    let n = prime_vertical_radius(lat_rad);

    let x = (n + height) * lat_rad.cos() * lon_rad.cos();
    let y = (n + height) * lat_rad.cos() * lon_rad.sin();
    let z = (n * (1.0 - WGS84_ECCENTRICITY_SQUARED) + height) * lat_rad.sin();

    EcefVector::new(x, y, z)
}

/// Convert an ECEF position back to geodetic coordinates (Bowring's method)
pub fn ecef_to_geodetic(ecef: &EcefVector) -> GeodeticCoordinate {
    let a = WGS84_SEMI_MAJOR_AXIS;
    let b = WGS84_SEMI_MINOR_AXIS;
    let e2 = WGS84_ECCENTRICITY_SQUARED;
    // Second eccentricity squared
    let ep2 = (a * a - b * b) / (b * b);

    let x = ecef.0.x;
    let y = ecef.0.y;
    let z = ecef.0.z;

    let p = (x * x + y * y).sqrt();
    let theta = (z * a).atan2(p * b);

    let lat_rad = (z + ep2 * b * theta.sin().powi(3)).atan2(p - e2 * a * theta.cos().powi(3));
    let lon_rad = y.atan2(x);

    let n = prime_vertical_radius(lat_rad);
    // Near the poles p/cos(lat) degenerates; derive height from z instead
    let height = if p > 1e-6 && lat_rad.cos().abs() > 1e-9 {
        p / lat_rad.cos() - n
    } else {
        z.abs() - b
    };

    GeodeticCoordinate::new(lat_rad.to_degrees(), lon_rad.to_degrees(), height)
}

/// Rotation matrix taking an ECEF delta into the ENU frame anchored at `origin`.
///
/// Rows are the east, north, and up unit vectors expressed in ECEF:
/// east = (-sin lon, cos lon, 0), north and up per the standard ENU
/// parameterization. A sign slip here silently mirrors the whole scene, so the
/// matrix is covered by the fixed regression pair in the tests below.
pub fn enu_rotation(origin: &GeodeticCoordinate) -> Matrix3<f64> {
    let lat_rad = origin.latitude_deg.to_radians();
    let lon_rad = origin.longitude_deg.to_radians();

    let sin_lat = lat_rad.sin();
    let cos_lat = lat_rad.cos();
    let sin_lon = lon_rad.sin();
    let cos_lon = lon_rad.cos();

    Matrix3::new(
        -sin_lon,
        cos_lon,
        0.0,
        -sin_lat * cos_lon,
        -sin_lat * sin_lon,
        cos_lat,
        cos_lat * cos_lon,
        cos_lat * sin_lon,
        sin_lat,
    )
}

/// Convert an ECEF position to ENU relative to `origin`
pub fn ecef_to_enu(point: &EcefVector, origin: &GeodeticCoordinate) -> EnuVector {
    let origin_ecef = geodetic_to_ecef(origin);
    let delta: Vector3<f64> = point.0 - origin_ecef.0;
    EnuVector::from_vector(enu_rotation(origin) * delta)
}

/// Convert an ENU position relative to `origin` back to ECEF
pub fn enu_to_ecef(point: &EnuVector, origin: &GeodeticCoordinate) -> EcefVector {
    let origin_ecef = geodetic_to_ecef(origin);
    let delta = enu_rotation(origin).transpose() * point.to_vector();
    EcefVector(origin_ecef.0 + delta)
}

/// Convert a geodetic coordinate to ENU relative to a geodetic origin
pub fn geodetic_to_enu(point: &GeodeticCoordinate, origin: &GeodeticCoordinate) -> EnuVector {
    ecef_to_enu(&geodetic_to_ecef(point), origin)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geodetic_to_ecef_at_equator() {
        let position = GeodeticCoordinate::new(0.0, 0.0, 0.0);
        let ecef = geodetic_to_ecef(&position);

        // On the equator at the prime meridian, x is the semi-major axis
        assert!((ecef.0.x - WGS84_SEMI_MAJOR_AXIS).abs() < 1e-6);
        assert!(ecef.0.y.abs() < 1e-6);
        assert!(ecef.0.z.abs() < 1e-6);
    }

    #[test]
    fn test_geodetic_ecef_round_trip() {
        let position = GeodeticCoordinate::new(45.0, 10.0, 100.0);
        let recovered = ecef_to_geodetic(&geodetic_to_ecef(&position));

        assert!((recovered.latitude_deg - position.latitude_deg).abs() < 1e-9);
        assert!((recovered.longitude_deg - position.longitude_deg).abs() < 1e-9);
        assert!((recovered.height_m - position.height_m).abs() < 1e-6);
    }

    #[test]
    fn test_enu_round_trip_through_ecef() {
        let origin = GeodeticCoordinate::new(45.0, 10.0, 100.0);
        let point = GeodeticCoordinate::new(45.001, 10.002, 130.0);

        let enu = geodetic_to_enu(&point, &origin);
        let recovered = ecef_to_geodetic(&enu_to_ecef(&enu, &origin));

        assert!((recovered.latitude_deg - point.latitude_deg).abs() < 1e-9);
        assert!((recovered.longitude_deg - point.longitude_deg).abs() < 1e-9);
        assert!((recovered.height_m - point.height_m).abs() < 1e-6);
    }

    #[test]
    fn test_enu_north_regression_fixture() {
        // Fixed regression pair: 0.0001 deg of latitude at lat 45 is about
        // 11.057 m of northing and nothing else.
        let origin = GeodeticCoordinate::new(45.0, 10.0, 100.0);
        let point = GeodeticCoordinate::new(45.0001, 10.0, 100.0);

        let enu = geodetic_to_enu(&point, &origin);

        assert!(enu.east_m.abs() < 0.01);
        assert!((enu.north_m - 11.057).abs() < 0.01);
        assert!(enu.up_m.abs() < 0.01);
    }

    #[test]
    fn test_origin_maps_to_enu_zero() {
        let origin = GeodeticCoordinate::new(-33.8568, 151.2153, 58.0);
        let enu = geodetic_to_enu(&origin, &origin);

        assert!(enu.east_m.abs() < 1e-9);
        assert!(enu.north_m.abs() < 1e-9);
        assert!(enu.up_m.abs() < 1e-9);
    }

    #[test]
    fn test_polar_latitude_stays_finite() {
        for lat in [90.0, -90.0] {
            let position = GeodeticCoordinate::new(lat, 0.0, 0.0);
            let ecef = geodetic_to_ecef(&position);
            assert!(ecef.0.iter().all(|c| c.is_finite()));
            // z magnitude at the pole is the semi-minor axis
            assert!((ecef.0.z.abs() - WGS84_SEMI_MINOR_AXIS).abs() < 1e-3);
        }
    }

    #[test]
    fn test_east_sign_convention() {
        // A point east of the origin must come out with positive east,
        // the classic silent-mirror defect.
        let origin = GeodeticCoordinate::new(45.0, 10.0, 0.0);
        let east_point = GeodeticCoordinate::new(45.0, 10.0001, 0.0);

        let enu = geodetic_to_enu(&east_point, &origin);
        assert!(enu.east_m > 7.0);
        assert!(enu.north_m.abs() < 0.01);
    }
}
