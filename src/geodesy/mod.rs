pub mod wgs84;

pub use wgs84::{
    ecef_to_enu, ecef_to_geodetic, enu_rotation, enu_to_ecef, geodetic_to_ecef, geodetic_to_enu,
};
