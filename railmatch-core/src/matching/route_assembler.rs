use std::collections::HashSet;

use itertools::Itertools;

use super::{
    AssemblyPolicy, ConnectivityPolicy, DropReason, PointMatch, RejectionReason, RevisitPolicy,
    RouteOutcome, StopMatch,
};
use crate::model::{MatchedRoute, Topology};

/// a stop that contributed no edge to its trip's route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedPoint {
    pub stop_id: String,
    pub reason: DropReason,
}

/// everything the run summary needs to know about one processed trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripReport {
    pub outcome: RouteOutcome,
    pub points_total: usize,
    pub dropped_points: Vec<DroppedPoint>,
    pub disconnected_jumps: usize,
}

impl TripReport {
    /// a trip rejected before any of its stops were matched.
    pub fn rejected(trip_id: &str, points_total: usize, reason: RejectionReason) -> Self {
        Self {
            outcome: RouteOutcome::rejected(trip_id, reason),
            points_total,
            dropped_points: vec![],
            disconnected_jumps: 0,
        }
    }

    /// records stops removed upstream for lacking coordinates.
    pub fn with_missing_stops(mut self, stop_ids: &[String]) -> Self {
        self.points_total += stop_ids.len();
        self.dropped_points.extend(stop_ids.iter().map(|stop_id| DroppedPoint {
            stop_id: stop_id.clone(),
            reason: DropReason::MissingCoordinate,
        }));
        self
    }
}

/// combines per-stop matches into a validated route.
#[derive(Debug, Clone, Copy, Default)]
pub struct RouteAssembler {
    policy: AssemblyPolicy,
}

impl RouteAssembler {
    pub fn new(policy: AssemblyPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &AssemblyPolicy {
        &self.policy
    }

    /// builds the route of a trip from its stop matches in stop order.
    ///
    /// unmatched stops are dropped with a warning, keeping the relative order of the rest.
    /// consecutive repeats of an edge collapse to one occurrence. the route is rejected when
    /// fewer than two distinct edges remain, or when the revisit or connectivity policy says so.
    pub fn assemble(&self, trip_id: &str, matches: &[StopMatch], topology: &Topology) -> TripReport {
        let mut dropped_points = vec![];
        let mut edges: Vec<String> = Vec::with_capacity(matches.len());
        for stop_match in matches.iter() {
            match &stop_match.result {
                PointMatch::Matched { edge_id, .. } => edges.push(edge_id.clone()),
                PointMatch::Dropped { reason, nearest } => {
                    let nearest_msg = match nearest {
                        Some((id, distance)) => {
                            format!(", nearest edge '{id}' at distance {distance:.2}")
                        }
                        None => String::new(),
                    };
                    log::warn!(
                        "trip '{trip_id}': skipping stop '{}' ({reason}{nearest_msg})",
                        stop_match.stop_id
                    );
                    dropped_points.push(DroppedPoint {
                        stop_id: stop_match.stop_id.clone(),
                        reason: *reason,
                    });
                }
            }
        }
        edges.dedup();

        let mut report = TripReport {
            outcome: RouteOutcome::rejected(trip_id, RejectionReason::InsufficientValidEdges),
            points_total: matches.len(),
            dropped_points,
            disconnected_jumps: 0,
        };

        let distinct = edges.iter().collect::<HashSet<_>>();
        if distinct.len() < 2 {
            return report;
        }

        if self.policy.revisits == RevisitPolicy::Reject {
            if let Some(revisited) = first_revisit(&edges) {
                report.outcome =
                    RouteOutcome::rejected(trip_id, RejectionReason::EdgeRevisited(revisited));
                return report;
            }
        }

        if self.policy.connectivity != ConnectivityPolicy::Ignore {
            for (from, to) in edges.iter().tuple_windows() {
                if self.connected(from, to, topology) {
                    continue;
                }
                report.disconnected_jumps += 1;
                match self.policy.connectivity {
                    ConnectivityPolicy::Reject => {
                        report.outcome = RouteOutcome::rejected(
                            trip_id,
                            RejectionReason::DisconnectedEdges {
                                from: from.clone(),
                                to: to.clone(),
                            },
                        );
                        return report;
                    }
                    _ => log::warn!("trip '{trip_id}': edges '{from}' and '{to}' do not touch"),
                }
            }
        }

        report.outcome = RouteOutcome::Accepted(MatchedRoute::new(trip_id.to_string(), edges));
        report
    }

    fn connected(&self, from: &str, to: &str, topology: &Topology) -> bool {
        match (topology.get(from), topology.get(to)) {
            (Some(a), Some(b)) => a.touches(b, self.policy.endpoint_tolerance),
            _ => false,
        }
    }
}

/// first edge that reappears after the route has moved on to another edge.
/// expects consecutive duplicates to be collapsed already.
fn first_revisit(edges: &[String]) -> Option<String> {
    let mut seen = HashSet::new();
    edges
        .iter()
        .find(|edge_id| !seen.insert(edge_id.as_str()))
        .cloned()
}
