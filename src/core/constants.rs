/// WGS-84 semi-major axis in meters
pub const WGS84_SEMI_MAJOR_AXIS: f64 = 6378137.0;

/// WGS-84 semi-minor axis in meters
pub const WGS84_SEMI_MINOR_AXIS: f64 = 6356752.3142;

/// WGS-84 flattening factor, f = (a - b) / a
pub const WGS84_FLATTENING: f64 =
    (WGS84_SEMI_MAJOR_AXIS - WGS84_SEMI_MINOR_AXIS) / WGS84_SEMI_MAJOR_AXIS;

/// WGS-84 first eccentricity squared, e2 = f * (2 - f)
pub const WGS84_ECCENTRICITY_SQUARED: f64 = WGS84_FLATTENING * (2.0 - WGS84_FLATTENING);
