use std::fmt::Display;

use crate::model::MatchedRoute;

/// why a trip produced no route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectionReason {
    /// fewer than two distinct edges remained after dropping and collapsing
    InsufficientValidEdges,
    /// two consecutive route edges do not touch
    DisconnectedEdges { from: String, to: String },
    /// the route returns to an edge it already left
    EdgeRevisited(String),
    /// at least one stop of the trip has no coordinate
    MissingStopCoordinates,
    /// stop coordinates could not be brought into the topology's reference system
    CoordinateSystem(String),
}

impl RejectionReason {
    /// stable label used to aggregate rejections in the run summary.
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectionReason::InsufficientValidEdges => "insufficient valid edges",
            RejectionReason::DisconnectedEdges { .. } => "disconnected edges",
            RejectionReason::EdgeRevisited(_) => "edge revisited",
            RejectionReason::MissingStopCoordinates => "missing stop coordinates",
            RejectionReason::CoordinateSystem(_) => "coordinate system error",
        }
    }

    /// label plus the detail specific to this trip
    pub fn detail(&self) -> String {
        match self {
            RejectionReason::DisconnectedEdges { from, to } => {
                format!("{}: '{from}' -> '{to}'", self.as_str())
            }
            RejectionReason::EdgeRevisited(edge_id) => format!("{}: '{edge_id}'", self.as_str()),
            RejectionReason::CoordinateSystem(message) => format!("{}: {message}", self.as_str()),
            _ => self.as_str().to_string(),
        }
    }
}

impl Display for RejectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub trip_id: String,
    pub reason: RejectionReason,
}

/// final verdict for one trip: a usable route or a reason why there is none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    Accepted(MatchedRoute),
    Rejected(Rejection),
}

impl RouteOutcome {
    pub fn rejected(trip_id: impl Into<String>, reason: RejectionReason) -> Self {
        RouteOutcome::Rejected(Rejection {
            trip_id: trip_id.into(),
            reason,
        })
    }

    pub fn trip_id(&self) -> &str {
        match self {
            RouteOutcome::Accepted(route) => route.trip_id(),
            RouteOutcome::Rejected(rejection) => &rejection.trip_id,
        }
    }

    pub fn route(&self) -> Option<&MatchedRoute> {
        match self {
            RouteOutcome::Accepted(route) => Some(route),
            RouteOutcome::Rejected(_) => None,
        }
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            RouteOutcome::Accepted(_) => None,
            RouteOutcome::Rejected(rejection) => Some(rejection),
        }
    }
}
