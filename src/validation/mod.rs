pub mod data;
pub mod error;

pub use data::{validate_coordinate, validate_pose};
pub use error::{ReconcileError, ReconcileResult};
