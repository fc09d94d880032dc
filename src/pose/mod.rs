pub mod transform;

pub use transform::{transform_point, transform_pose};
