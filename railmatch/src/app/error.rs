use std::path::PathBuf;

use railmatch_core::RailMatchError;
use railmatch_sumo::SumoFileError;

#[derive(thiserror::Error, Debug)]
pub enum RailMatchAppError {
    #[error("Invalid input: {0}")]
    InvalidUserInput(String),
    #[error("Error reading from '{path}': {message}")]
    ReadError { path: PathBuf, message: String },
    #[error("Error writing to '{path}': {message}")]
    WriteError { path: PathBuf, message: String },
    #[error("Failed to read GTFS feed '{path}': {message}")]
    GtfsError { path: PathBuf, message: String },
    #[error(transparent)]
    MatchError(#[from] RailMatchError),
    #[error(transparent)]
    SumoError(#[from] SumoFileError),
    #[error("{0}")]
    InternalError(String),
}
