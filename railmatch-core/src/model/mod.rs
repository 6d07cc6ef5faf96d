mod edge;
mod matched_route;
mod topology;
mod trip;
mod valid_edge_set;

pub use edge::{Edge, EdgeRecord};
pub use matched_route::MatchedRoute;
pub use topology::{NearestEdge, Topology, TopologyLoadReport};
pub use trip::{Stop, Trip};
pub use valid_edge_set::ValidEdgeSet;
