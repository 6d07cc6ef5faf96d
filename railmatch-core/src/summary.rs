use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{
    matching::{RouteOutcome, TripReport},
    model::TopologyLoadReport,
};

/// run-level aggregate of all trip reports, written next to the route output.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct RunSummary {
    /// date and time this summary was created
    pub created: String,
    pub trips_processed: usize,
    pub trips_accepted: usize,
    pub trips_rejected: usize,
    /// rejection label to trip count, most common first
    pub rejection_reasons: IndexMap<String, usize>,
    /// stops across all trips, including dropped ones
    pub points_total: usize,
    pub points_dropped: usize,
    /// drop label to stop count, most common first
    pub dropped_points_by_reason: IndexMap<String, usize>,
    /// consecutive edge pairs that do not touch, counted only when connectivity is checked
    pub disconnected_jumps: usize,
    pub topology: TopologySummary,
    /// number of edge ids in the compiled network
    pub valid_edges: usize,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct TopologySummary {
    pub edges_loaded: usize,
    pub records_dropped: usize,
}

impl From<&TopologyLoadReport> for TopologySummary {
    fn from(value: &TopologyLoadReport) -> Self {
        Self {
            edges_loaded: value.edges_loaded,
            records_dropped: value.records_dropped(),
        }
    }
}

impl RunSummary {
    pub fn new<'a, I>(reports: I, topology: &TopologyLoadReport, valid_edges: usize) -> Self
    where
        I: IntoIterator<Item = &'a TripReport>,
    {
        let mut summary = RunSummary {
            created: chrono::Utc::now().to_rfc3339(),
            trips_processed: 0,
            trips_accepted: 0,
            trips_rejected: 0,
            rejection_reasons: IndexMap::new(),
            points_total: 0,
            points_dropped: 0,
            dropped_points_by_reason: IndexMap::new(),
            disconnected_jumps: 0,
            topology: TopologySummary::from(topology),
            valid_edges,
        };
        for report in reports {
            summary.trips_processed += 1;
            match &report.outcome {
                RouteOutcome::Accepted(_) => summary.trips_accepted += 1,
                RouteOutcome::Rejected(rejection) => {
                    summary.trips_rejected += 1;
                    *summary
                        .rejection_reasons
                        .entry(rejection.reason.as_str().to_string())
                        .or_insert(0) += 1;
                }
            }
            summary.points_total += report.points_total;
            summary.points_dropped += report.dropped_points.len();
            for dropped in report.dropped_points.iter() {
                *summary
                    .dropped_points_by_reason
                    .entry(dropped.reason.as_str().to_string())
                    .or_insert(0) += 1;
            }
            summary.disconnected_jumps += report.disconnected_jumps;
        }
        sort_by_count(&mut summary.rejection_reasons);
        sort_by_count(&mut summary.dropped_points_by_reason);
        summary
    }

    /// up to `n` rejection labels with their counts, most common first.
    pub fn most_common_rejections(&self, n: usize) -> Vec<(&str, usize)> {
        self.rejection_reasons
            .iter()
            .take(n)
            .map(|(reason, count)| (reason.as_str(), *count))
            .collect()
    }
}

/// descending count, ties by label so output is stable.
fn sort_by_count(counts: &mut IndexMap<String, usize>) {
    counts.sort_by(|k1, v1, k2, v2| v2.cmp(v1).then_with(|| k1.cmp(k2)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::{DropReason, DroppedPoint, RejectionReason};

    fn rejected(reason: RejectionReason, dropped: &[DropReason]) -> TripReport {
        let mut report = TripReport::rejected("t", dropped.len() + 1, reason);
        report.dropped_points = dropped
            .iter()
            .map(|reason| DroppedPoint {
                stop_id: String::from("s"),
                reason: *reason,
            })
            .collect();
        report
    }

    #[test]
    fn test_counts_and_ordering() {
        let reports = vec![
            rejected(RejectionReason::EdgeRevisited(String::from("e1")), &[]),
            rejected(
                RejectionReason::InsufficientValidEdges,
                &[DropReason::InvalidEdge, DropReason::InvalidEdge],
            ),
            rejected(RejectionReason::InsufficientValidEdges, &[DropReason::NoCandidate]),
        ];
        let load_report = TopologyLoadReport {
            records_read: 10,
            edges_loaded: 8,
            dropped_missing_geometry: 1,
            dropped_invalid_geometry: 1,
            dropped_duplicate_id: 0,
        };
        let summary = RunSummary::new(&reports, &load_report, 7);
        assert_eq!(summary.trips_processed, 3);
        assert_eq!(summary.trips_accepted, 0);
        assert_eq!(summary.trips_rejected, 3);
        assert_eq!(
            summary.most_common_rejections(5),
            vec![("insufficient valid edges", 2), ("edge revisited", 1)]
        );
        assert_eq!(summary.points_total, 6);
        assert_eq!(summary.points_dropped, 3);
        assert_eq!(
            summary.dropped_points_by_reason.first(),
            Some((&String::from("edge not in compiled network"), &2))
        );
        assert_eq!(
            summary.topology,
            TopologySummary {
                edges_loaded: 8,
                records_dropped: 2
            }
        );
        assert_eq!(summary.valid_edges, 7);
    }

    #[test]
    fn test_serializes_snake_case() {
        let reports: Vec<TripReport> = vec![];
        let summary = RunSummary::new(&reports, &TopologyLoadReport::default(), 1);
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["trips_processed"], 0);
        assert_eq!(json["topology"]["edges_loaded"], 0);
        assert!(json["rejection_reasons"].as_object().unwrap().is_empty());
    }
}
