use std::collections::HashMap;

use geo::Point;
use rstar::{
    primitives::{GeomWithData, Line},
    PointDistance, RTree,
};
use serde::{Deserialize, Serialize};

use super::{Edge, EdgeRecord};
use crate::{crs::Crs, matching::TieBreakPolicy, RailMatchError};

/// one straight piece of an edge polyline, tagged with the index of its edge in load order.
type EdgeSegment = GeomWithData<Line<[f64; 2]>, usize>;

/// relative tolerance when comparing squared distances for equality.
const TIE_TOLERANCE: f64 = 1e-12;

/// the loaded rail geometry. edges keep their original load order, which is the
/// default tie-break when two edges are equally close to a point.
pub struct Topology {
    crs: Crs,
    edges: Vec<Edge>,
    lookup: HashMap<String, usize>,
    index: RTree<EdgeSegment>,
}

/// counts describing how topology records were loaded.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct TopologyLoadReport {
    pub records_read: usize,
    pub edges_loaded: usize,
    pub dropped_missing_geometry: usize,
    pub dropped_invalid_geometry: usize,
    pub dropped_duplicate_id: usize,
}

impl TopologyLoadReport {
    pub fn records_dropped(&self) -> usize {
        self.dropped_missing_geometry + self.dropped_invalid_geometry + self.dropped_duplicate_id
    }
}

/// result of a nearest-edge query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearestEdge {
    /// position of the edge in load order
    pub edge_index: usize,
    /// minimum perpendicular distance from the query point to the edge polyline
    pub distance: f64,
}

impl Topology {
    /// builds the spatial index over the given edges. edge ids are expected to be unique,
    /// a repeated id resolves to its first occurrence.
    pub fn new(crs: Crs, edges: Vec<Edge>) -> Result<Topology, RailMatchError> {
        if !crs.is_projected() {
            let msg = format!("topology must use a projected reference system, found {crs}");
            return Err(RailMatchError::UnsupportedCrs(msg));
        }
        let mut lookup = HashMap::with_capacity(edges.len());
        for (idx, edge) in edges.iter().enumerate() {
            lookup.entry(edge.id.clone()).or_insert(idx);
        }
        let segments = edges
            .iter()
            .enumerate()
            .flat_map(|(idx, edge)| edge_segments(edge).map(move |line| GeomWithData::new(line, idx)))
            .collect::<Vec<_>>();
        let index = RTree::bulk_load(segments);
        Ok(Topology {
            crs,
            edges,
            lookup,
            index,
        })
    }

    /// loads topology rows. rows with missing or unparseable geometry and rows repeating an
    /// earlier id are dropped and counted in the report.
    ///
    /// # Errors
    ///
    /// fails with [`RailMatchError::EmptyTopology`] if no edge survives loading.
    pub fn from_records<I>(
        crs: Crs,
        records: I,
    ) -> Result<(Topology, TopologyLoadReport), RailMatchError>
    where
        I: IntoIterator<Item = EdgeRecord>,
    {
        let mut report = TopologyLoadReport::default();
        let mut seen: HashMap<String, usize> = HashMap::new();
        let mut edges = vec![];
        for record in records {
            report.records_read += 1;
            if seen.contains_key(&record.id) {
                log::warn!("dropping edge record with duplicate id '{}'", record.id);
                report.dropped_duplicate_id += 1;
                continue;
            }
            let missing = record
                .geometry
                .as_deref()
                .map(|g| g.trim().is_empty())
                .unwrap_or(true);
            if missing {
                report.dropped_missing_geometry += 1;
                continue;
            }
            match Edge::try_from_record(&record) {
                Ok(edge) => {
                    seen.insert(edge.id.clone(), edges.len());
                    edges.push(edge);
                }
                Err(e) => {
                    log::warn!("dropping edge record: {e}");
                    report.dropped_invalid_geometry += 1;
                }
            }
        }
        report.edges_loaded = edges.len();
        if report.dropped_missing_geometry > 0 {
            log::warn!(
                "dropped {} edge records with missing geometry",
                report.dropped_missing_geometry
            );
        }
        if edges.is_empty() {
            return Err(RailMatchError::EmptyTopology);
        }
        let topology = Topology::new(crs, edges)?;
        Ok((topology, report))
    }

    pub fn crs(&self) -> Crs {
        self.crs
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn edge(&self, edge_index: usize) -> Option<&Edge> {
        self.edges.get(edge_index)
    }

    pub fn get(&self, edge_id: &str) -> Option<&Edge> {
        self.lookup.get(edge_id).and_then(|idx| self.edges.get(*idx))
    }

    /// finds the edge with minimum perpendicular distance to `point` using the spatial index.
    /// returns None only for an empty topology.
    pub fn nearest_edge(&self, point: &Point<f64>, tie_break: TieBreakPolicy) -> Option<NearestEdge> {
        let query = [point.x(), point.y()];
        let mut candidates = self.index.nearest_neighbor_iter_with_distance_2(&query);
        let (first, best_d2) = candidates.next()?;
        let mut best = first.data;
        // segments arrive in non-decreasing distance order, so ties are contiguous
        for (segment, d2) in candidates {
            if !is_tie(d2, best_d2) {
                break;
            }
            if self.prefer(segment.data, best, tie_break) {
                best = segment.data;
            }
        }
        Some(NearestEdge {
            edge_index: best,
            distance: best_d2.sqrt(),
        })
    }

    /// exhaustive O(E) variant of [`Topology::nearest_edge`] with identical semantics.
    pub fn nearest_edge_linear(
        &self,
        point: &Point<f64>,
        tie_break: TieBreakPolicy,
    ) -> Option<NearestEdge> {
        let query = [point.x(), point.y()];
        let mut best: Option<(usize, f64)> = None;
        for (idx, edge) in self.edges.iter().enumerate() {
            let d2 = edge_segments(edge)
                .map(|line| line.distance_2(&query))
                .fold(f64::INFINITY, f64::min);
            best = match best {
                None => Some((idx, d2)),
                Some((best_idx, best_d2)) if is_tie(d2, best_d2) => {
                    if self.prefer(idx, best_idx, tie_break) {
                        Some((idx, d2.min(best_d2)))
                    } else {
                        Some((best_idx, d2.min(best_d2)))
                    }
                }
                Some((_, best_d2)) if d2 < best_d2 => Some((idx, d2)),
                unchanged => unchanged,
            };
        }
        best.map(|(edge_index, d2)| NearestEdge {
            edge_index,
            distance: d2.sqrt(),
        })
    }

    /// true if `candidate` wins a distance tie against `incumbent`.
    fn prefer(&self, candidate: usize, incumbent: usize, tie_break: TieBreakPolicy) -> bool {
        match tie_break {
            TieBreakPolicy::LoadOrder => candidate < incumbent,
            TieBreakPolicy::EdgeId => {
                let c = &self.edges[candidate].id;
                let i = &self.edges[incumbent].id;
                c < i || (c == i && candidate < incumbent)
            }
        }
    }
}

fn edge_segments(edge: &Edge) -> impl Iterator<Item = Line<[f64; 2]>> + '_ {
    edge.geometry
        .lines()
        .filter(|l| l.start != l.end)
        .map(|l| Line::new([l.start.x, l.start.y], [l.end.x, l.end.y]))
}

fn is_tie(d2: f64, best_d2: f64) -> bool {
    (d2 - best_d2).abs() <= TIE_TOLERANCE * best_d2.max(1.0)
}
