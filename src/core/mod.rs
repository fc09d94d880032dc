pub mod constants;
pub mod types;

pub use constants::*;
pub use types::{EcefVector, EnuVector, Frame, GeodeticCoordinate, Pose, SequenceOrigin};
