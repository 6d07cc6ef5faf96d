use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// why a stop produced no usable edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// the topology has no edges to match against
    NoCandidate,
    /// the nearest edge is not part of the compiled network
    InvalidEdge,
    /// the nearest edge is farther than the configured maximum distance
    BeyondTolerance,
    /// the stop has no coordinate
    MissingCoordinate,
}

impl DropReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DropReason::NoCandidate => "no candidate edge",
            DropReason::InvalidEdge => "edge not in compiled network",
            DropReason::BeyondTolerance => "beyond tolerance",
            DropReason::MissingCoordinate => "missing coordinate",
        }
    }
}

impl Display for DropReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// outcome of matching a single point.
#[derive(Debug, Clone, PartialEq)]
pub enum PointMatch {
    Matched { edge_id: String, distance: f64 },
    Dropped {
        reason: DropReason,
        /// the nearest edge, if there was one
        nearest: Option<(String, f64)>,
    },
}

impl PointMatch {
    pub fn edge_id(&self) -> Option<&str> {
        match self {
            PointMatch::Matched { edge_id, .. } => Some(edge_id),
            PointMatch::Dropped { .. } => None,
        }
    }

    pub fn drop_reason(&self) -> Option<DropReason> {
        match self {
            PointMatch::Matched { .. } => None,
            PointMatch::Dropped { reason, .. } => Some(*reason),
        }
    }
}

/// a point match attributed to the stop it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct StopMatch {
    pub stop_id: String,
    pub result: PointMatch,
}

impl StopMatch {
    pub fn new(stop_id: impl Into<String>, result: PointMatch) -> Self {
        Self {
            stop_id: stop_id.into(),
            result,
        }
    }
}
