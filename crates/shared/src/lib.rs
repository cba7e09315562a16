pub mod errors;
pub mod models;

#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;

pub use errors::*;
pub use models::*;
