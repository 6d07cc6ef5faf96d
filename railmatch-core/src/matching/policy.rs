use serde::{Deserialize, Serialize};

/// decides between edges at equal minimum distance from a point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreakPolicy {
    /// the edge appearing first in the topology's load order wins
    #[default]
    LoadOrder,
    /// the lexicographically smallest edge id wins
    EdgeId,
}

/// what to do when two consecutive route edges do not touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectivityPolicy {
    /// accept the route without checking adjacency
    #[default]
    Ignore,
    /// accept the route but log and count each disconnected jump
    Warn,
    /// reject the trip at the first disconnected jump
    Reject,
}

/// what to do when a route returns to an edge it already left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevisitPolicy {
    /// keep non-consecutive repeats as they are
    #[default]
    Preserve,
    /// reject the trip
    Reject,
}

/// parameters of the per-point nearest-edge search.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MatcherConfig {
    /// nearest edges farther than this (in topology units) are not accepted
    #[serde(default)]
    pub max_distance: Option<f64>,
    #[serde(default)]
    pub tie_break: TieBreakPolicy,
}

/// parameters of route assembly and validation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AssemblyPolicy {
    #[serde(default)]
    pub connectivity: ConnectivityPolicy,
    #[serde(default)]
    pub revisits: RevisitPolicy,
    /// endpoints closer than this count as touching when node references are missing
    #[serde(default = "default_endpoint_tolerance")]
    pub endpoint_tolerance: f64,
}

fn default_endpoint_tolerance() -> f64 {
    1.0
}

impl Default for AssemblyPolicy {
    fn default() -> Self {
        Self {
            connectivity: ConnectivityPolicy::default(),
            revisits: RevisitPolicy::default(),
            endpoint_tolerance: default_endpoint_tolerance(),
        }
    }
}
