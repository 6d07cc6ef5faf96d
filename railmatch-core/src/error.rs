use crate::crs::Crs;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum RailMatchError {
    #[error("topology contains no usable edges, cannot match stops against it")]
    EmptyTopology,
    #[error("valid edge set is empty, matched edges cannot be validated against the compiled network")]
    EmptyValidEdgeSet,
    #[error("unsupported coordinate reference system: {0}")]
    UnsupportedCrs(String),
    #[error("no coordinate transform available from {source_crs} to {target_crs}")]
    UnsupportedTransform { source_crs: Crs, target_crs: Crs },
    #[error("coordinate reference system mismatch: topology uses {expected} but point is in {found}")]
    CrsMismatch { expected: Crs, found: Crs },
    #[error("invalid coordinate ({x}, {y}): {message}")]
    InvalidCoordinate { x: f64, y: f64, message: String },
    #[error("invalid edge geometry for '{edge_id}': {message}")]
    InvalidGeometry { edge_id: String, message: String },
    #[error("{0}")]
    InternalError(String),
}
