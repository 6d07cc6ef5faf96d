use super::{DropReason, MatcherConfig, PointMatch, StopMatch};
use crate::{
    crs::{CoordinateNormalizer, ProjectedPoint},
    model::{Topology, Trip, ValidEdgeSet},
    RailMatchError,
};

/// nearest-edge search over a shared, read-only topology and valid edge set.
pub struct EdgeMatcher<'a> {
    topology: &'a Topology,
    valid_edges: &'a ValidEdgeSet,
    config: MatcherConfig,
}

impl<'a> EdgeMatcher<'a> {
    pub fn new(topology: &'a Topology, valid_edges: &'a ValidEdgeSet, config: MatcherConfig) -> Self {
        Self {
            topology,
            valid_edges,
            config,
        }
    }

    pub fn topology(&self) -> &Topology {
        self.topology
    }

    /// matches a point to the closest edge of the topology.
    ///
    /// only the single nearest edge is considered: if it is not part of the valid edge set
    /// or lies beyond the configured maximum distance, the point is dropped rather than
    /// falling back to the next closest edge.
    ///
    /// # Errors
    ///
    /// the point must be expressed in the topology's reference system.
    pub fn match_point(&self, point: &ProjectedPoint) -> Result<PointMatch, RailMatchError> {
        if point.crs != self.topology.crs() {
            return Err(RailMatchError::CrsMismatch {
                expected: self.topology.crs(),
                found: point.crs,
            });
        }
        let Some(nearest) = self.topology.nearest_edge(&point.point, self.config.tie_break) else {
            return Ok(PointMatch::Dropped {
                reason: DropReason::NoCandidate,
                nearest: None,
            });
        };
        let edge = self.topology.edge(nearest.edge_index).ok_or_else(|| {
            RailMatchError::InternalError(format!(
                "spatial index returned edge index {} outside of topology with {} edges",
                nearest.edge_index,
                self.topology.len()
            ))
        })?;
        let nearest_pair = Some((edge.id.clone(), nearest.distance));
        if let Some(max_distance) = self.config.max_distance {
            if nearest.distance > max_distance {
                return Ok(PointMatch::Dropped {
                    reason: DropReason::BeyondTolerance,
                    nearest: nearest_pair,
                });
            }
        }
        if !self.valid_edges.contains(&edge.id) {
            return Ok(PointMatch::Dropped {
                reason: DropReason::InvalidEdge,
                nearest: nearest_pair,
            });
        }
        Ok(PointMatch::Matched {
            edge_id: edge.id.clone(),
            distance: nearest.distance,
        })
    }

    /// normalizes and matches every stop of a trip, preserving stop order.
    ///
    /// # Errors
    ///
    /// any stop failing normalization, or a normalizer targeting another reference system
    /// than the topology, fails the whole trip.
    pub fn match_trip(
        &self,
        trip: &Trip,
        normalizer: &CoordinateNormalizer,
    ) -> Result<Vec<StopMatch>, RailMatchError> {
        if normalizer.target() != self.topology.crs() {
            return Err(RailMatchError::CrsMismatch {
                expected: self.topology.crs(),
                found: normalizer.target(),
            });
        }
        trip.stops
            .iter()
            .map(|stop| {
                let point = normalizer.normalize(stop.x, stop.y)?;
                let result = self.match_point(&point)?;
                match &result {
                    PointMatch::Matched { edge_id, distance } => {
                        log::debug!(
                            "trip '{}' stop '{}' matched edge '{edge_id}' at distance {distance:.2}",
                            trip.id,
                            stop.id
                        );
                    }
                    PointMatch::Dropped { reason, .. } => {
                        log::debug!("trip '{}' stop '{}' unmatched: {reason}", trip.id, stop.id);
                    }
                }
                Ok(StopMatch::new(stop.id.clone(), result))
            })
            .collect()
    }
}
