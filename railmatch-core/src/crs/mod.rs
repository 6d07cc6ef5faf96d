mod normalizer;
mod reference_system;

pub mod lv95;
pub mod utm;

pub use normalizer::CoordinateNormalizer;
pub use reference_system::Crs;

use geo::Point;

/// a point tagged with the reference system its coordinates are expressed in.
/// the matcher refuses to compare points against a topology in another system.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectedPoint {
    pub crs: Crs,
    pub point: Point<f64>,
}

impl ProjectedPoint {
    pub fn new(crs: Crs, point: Point<f64>) -> Self {
        Self { crs, point }
    }
}
