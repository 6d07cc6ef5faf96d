use serde::{Deserialize, Serialize};

/// the validated edge sequence of one trip. only the route assembler creates these,
/// which guarantees at least two distinct edges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedRoute {
    trip_id: String,
    edges: Vec<String>,
}

impl MatchedRoute {
    pub(crate) fn new(trip_id: String, edges: Vec<String>) -> Self {
        Self { trip_id, edges }
    }

    pub fn trip_id(&self) -> &str {
        &self.trip_id
    }

    pub fn edges(&self) -> &[String] {
        &self.edges
    }

    /// the edge list as the simulator expects it in a `route@edges` attribute.
    pub fn edges_attribute(&self) -> String {
        self.edges.join(" ")
    }
}
