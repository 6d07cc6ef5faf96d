use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use kdam::tqdm;
use serde::Deserialize;

use super::{StopRow, TripInput};
use crate::{app::RailMatchAppError, util::fs};

#[derive(Debug, Clone, Deserialize)]
struct StopsTxtRow {
    stop_id: String,
    #[serde(default)]
    stop_lat: Option<f64>,
    #[serde(default)]
    stop_lon: Option<f64>,
    #[serde(default)]
    parent_station: Option<String>,
}

/// (longitude, latitude) per stop id from a GTFS `stops.txt`. stops without their own
/// coordinates inherit those of their parent station.
pub fn read_stop_locations(
    stops_file: &Path,
) -> Result<HashMap<String, (f64, f64)>, RailMatchAppError> {
    let mut reader = fs::csv_reader(stops_file)?;
    let rows = reader
        .deserialize::<StopsTxtRow>()
        .enumerate()
        .map(|(idx, r)| {
            r.map_err(|e| RailMatchAppError::ReadError {
                path: stops_file.to_owned(),
                message: format!("row {}: {e}", idx + 1),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let own = rows
        .iter()
        .filter_map(|r| match (r.stop_lon, r.stop_lat) {
            (Some(lon), Some(lat)) => Some((r.stop_id.clone(), (lon, lat))),
            _ => None,
        })
        .collect::<HashMap<_, _>>();
    let mut locations = own.clone();
    for row in rows.iter().filter(|r| !own.contains_key(&r.stop_id)) {
        let parent = row
            .parent_station
            .as_deref()
            .filter(|p| !p.is_empty())
            .and_then(|p| own.get(p));
        match parent {
            Some(location) => {
                locations.insert(row.stop_id.clone(), *location);
            }
            None => log::debug!("stop '{}' has no location", row.stop_id),
        }
    }
    log::info!(
        "read {} stops from '{}', {} with a location",
        rows.len(),
        stops_file.display(),
        locations.len()
    );
    Ok(locations)
}

/// one trip per file in `sequence_directory` ending in `file_suffix`, in file name order.
/// the trip id is the file name without the suffix. files without a `stop_id` column
/// are skipped.
pub fn read_stop_sequence_trips(
    stops_file: &Path,
    sequence_directory: &Path,
    file_suffix: &str,
) -> Result<Vec<TripInput>, RailMatchAppError> {
    let locations = read_stop_locations(stops_file)?;
    let files = sequence_files(sequence_directory, file_suffix)?;
    if files.is_empty() {
        log::warn!(
            "no files ending in '{file_suffix}' found in '{}'",
            sequence_directory.display()
        );
    }
    let mut trips = vec![];
    for (trip_id, path) in tqdm!(files.into_iter(), desc = "read stop sequences") {
        if let Some(rows) = read_sequence_file(&path, &locations)? {
            trips.push(TripInput::from_rows(&trip_id, rows));
        }
    }
    eprintln!();
    log::info!(
        "read {} stop sequences from '{}'",
        trips.len(),
        sequence_directory.display()
    );
    Ok(trips)
}

fn sequence_files(
    directory: &Path,
    file_suffix: &str,
) -> Result<Vec<(String, PathBuf)>, RailMatchAppError> {
    let entries = std::fs::read_dir(directory).map_err(|e| RailMatchAppError::ReadError {
        path: directory.to_owned(),
        message: e.to_string(),
    })?;
    let mut files = vec![];
    for entry in entries {
        let path = entry
            .map_err(|e| RailMatchAppError::ReadError {
                path: directory.to_owned(),
                message: e.to_string(),
            })?
            .path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if let Some(trip_id) = name.strip_suffix(file_suffix).filter(|t| !t.is_empty()) {
            files.push((trip_id.to_string(), path.clone()));
        }
    }
    files.sort();
    Ok(files)
}

fn read_sequence_file(
    path: &Path,
    locations: &HashMap<String, (f64, f64)>,
) -> Result<Option<Vec<StopRow>>, RailMatchAppError> {
    let mut reader = fs::csv_reader(path)?;
    let headers = fs::headers(&mut reader, path)?;
    let Some(stop_col) = headers.iter().position(|h| h == "stop_id") else {
        log::warn!("'{}' has no stop_id column, skipping", path.display());
        return Ok(None);
    };
    let sequence_col = headers.iter().position(|h| h == "stop_sequence");
    let mut rows = vec![];
    for (idx, record) in reader.records().enumerate() {
        let record = record.map_err(|e| RailMatchAppError::ReadError {
            path: path.to_owned(),
            message: format!("row {}: {e}", idx + 1),
        })?;
        let Some(stop_id) = record.get(stop_col).filter(|s| !s.is_empty()) else {
            continue;
        };
        let sequence = sequence_col
            .and_then(|c| record.get(c))
            .filter(|s| !s.is_empty())
            .and_then(|s| {
                let parsed = parse_sequence(s);
                if parsed.is_none() {
                    log::warn!(
                        "'{}' row {}: stop_sequence '{s}' is not a non-negative integer",
                        path.display(),
                        idx + 1
                    );
                }
                parsed
            });
        rows.push(StopRow {
            stop_id: stop_id.to_string(),
            sequence,
            location: locations.get(stop_id).copied(),
        });
    }
    Ok(Some(rows))
}

/// accepts integers and integral decimals such as "3.0".
fn parse_sequence(value: &str) -> Option<u32> {
    if let Ok(sequence) = value.parse::<u32>() {
        return Some(sequence);
    }
    let decimal = value.parse::<f64>().ok()?;
    let integral = decimal.fract() == 0.0 && decimal >= 0.0 && decimal <= u32::MAX as f64;
    integral.then_some(decimal as u32)
}
