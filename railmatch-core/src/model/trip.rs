use serde::{Deserialize, Serialize};

/// a scheduled stop with its native (geographic) coordinate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub id: String,
    /// longitude, or easting for projected input
    pub x: f64,
    /// latitude, or northing for projected input
    pub y: f64,
}

impl Stop {
    pub fn new(id: impl Into<String>, x: f64, y: f64) -> Self {
        Self { id: id.into(), x, y }
    }
}

/// one vehicle run: stops in their intended visiting order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    pub id: String,
    pub stops: Vec<Stop>,
}

impl Trip {
    /// creates a trip keeping the stops in the order given.
    pub fn new(id: impl Into<String>, stops: Vec<Stop>) -> Self {
        Self {
            id: id.into(),
            stops,
        }
    }

    /// creates a trip from stops carrying a sequence number. the sort is stable, so
    /// stops sharing a sequence value keep their insertion order.
    pub fn from_sequenced(id: impl Into<String>, mut stops: Vec<(u32, Stop)>) -> Self {
        stops.sort_by_key(|(sequence, _)| *sequence);
        Self::new(id, stops.into_iter().map(|(_, stop)| stop).collect())
    }
}
