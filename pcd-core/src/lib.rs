pub mod error;
pub mod pointcloud;

pub use error::{ErrorKind, PcdError, Result};
