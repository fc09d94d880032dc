pub mod config;
pub mod natsort;

pub use config::{ConfigError, ReconcilerConfig};
pub use natsort::{natural_cmp, natural_sort};
