mod edge_matcher;
mod point_match;
mod policy;
mod rejection;
mod route_assembler;
mod route_mapper;

pub use edge_matcher::EdgeMatcher;
pub use point_match::{DropReason, PointMatch, StopMatch};
pub use policy::{AssemblyPolicy, ConnectivityPolicy, MatcherConfig, RevisitPolicy, TieBreakPolicy};
pub use rejection::{Rejection, RejectionReason, RouteOutcome};
pub use route_assembler::{DroppedPoint, RouteAssembler, TripReport};
pub use route_mapper::RouteMapper;
