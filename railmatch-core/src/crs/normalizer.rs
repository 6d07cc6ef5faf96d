use geo::{Coord, Point};

use super::{lv95, utm, Crs, ProjectedPoint};
use crate::RailMatchError;

/// converts stop coordinates from their native reference system into the
/// reference system of the topology. built once per run from the configured
/// source and target identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinateNormalizer {
    source: Crs,
    target: Crs,
}

impl CoordinateNormalizer {
    /// validates that a transform exists between `source` and `target`.
    ///
    /// # Errors
    ///
    /// the target must be projected (matching uses euclidean distance) and the pair
    /// must either be identical or start from WGS84.
    pub fn new(source: Crs, target: Crs) -> Result<Self, RailMatchError> {
        let supported = target.is_projected() && (source == target || source == Crs::Wgs84);
        if !supported {
            return Err(RailMatchError::UnsupportedTransform {
                source_crs: source,
                target_crs: target,
            });
        }
        Ok(Self { source, target })
    }

    pub fn source(&self) -> Crs {
        self.source
    }

    pub fn target(&self) -> Crs {
        self.target
    }

    /// converts a coordinate pair (x=longitude, y=latitude for geographic input)
    /// into a point tagged with the target reference system.
    pub fn normalize(&self, x: f64, y: f64) -> Result<ProjectedPoint, RailMatchError> {
        if !x.is_finite() || !y.is_finite() {
            return Err(RailMatchError::InvalidCoordinate {
                x,
                y,
                message: String::from("coordinate is not finite"),
            });
        }
        if self.source == self.target {
            return Ok(ProjectedPoint::new(self.target, Point::new(x, y)));
        }
        if !(-180.0..=180.0).contains(&x) || !(-90.0..=90.0).contains(&y) {
            return Err(RailMatchError::InvalidCoordinate {
                x,
                y,
                message: format!("outside the valid longitude/latitude range of {}", self.source),
            });
        }
        let (px, py) = match self.target {
            Crs::Lv95 => lv95::wgs84_to_lv95(x, y),
            Crs::UtmNorth(zone) => {
                if y < 0.0 {
                    return Err(RailMatchError::InvalidCoordinate {
                        x,
                        y,
                        message: format!("southern latitude cannot be projected into {}", self.target),
                    });
                }
                utm::wgs84_to_utm_north(x, y, zone)
            }
            Crs::Wgs84 => {
                return Err(RailMatchError::UnsupportedTransform {
                    source_crs: self.source,
                    target_crs: self.target,
                })
            }
        };
        Ok(ProjectedPoint::new(self.target, Point(Coord { x: px, y: py })))
    }
}
