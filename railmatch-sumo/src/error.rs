use std::path::PathBuf;

use railmatch_core::RailMatchError;

#[derive(thiserror::Error, Debug)]
pub enum SumoFileError {
    #[error("Invalid input: {0}")]
    InvalidUserInput(String),
    #[error("Error reading from '{path}': {message}")]
    ReadError { path: PathBuf, message: String },
    #[error("Error writing to '{path}': {message}")]
    WriteError { path: PathBuf, message: String },
    #[error("Malformed XML in '{path}': {message}")]
    XmlError { path: PathBuf, message: String },
    #[error("Error writing to csv: {0}")]
    CsvWriteError(String),
    #[error(transparent)]
    MatchError(#[from] RailMatchError),
}
