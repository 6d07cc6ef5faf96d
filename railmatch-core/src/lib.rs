pub mod crs;
mod error;
pub mod matching;
pub mod model;
pub mod summary;

pub use error::RailMatchError;
