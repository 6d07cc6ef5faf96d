use std::{collections::BTreeMap, path::Path};

use serde::{Deserialize, Serialize};

use crate::{util::fs, xml, SumoFileError};

pub const TRAVEL_TIME_FILENAME: &str = "travel_time.csv";
pub const DWELL_TIME_FILENAME: &str = "dwell_time.csv";
pub const HEADWAYS_FILENAME: &str = "headways.csv";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelTimeRow {
    pub train_id: String,
    pub depart: f64,
    pub arrival: f64,
    pub total_travel_time: f64,
    pub route_length: f64,
    pub average_speed: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DwellTimeRow {
    pub train_id: String,
    pub stop_edge: String,
    pub arrival_time: f64,
    pub departure_time: f64,
    pub dwell_time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadwayRow {
    pub station_edge: String,
    pub arrival_time: f64,
    pub headway_sec: f64,
}

/// one row per `tripinfo` element of a simulator trip info output.
pub fn read_tripinfo(path: &Path) -> Result<Vec<TravelTimeRow>, SumoFileError> {
    let text = fs::read_to_string(path)?;
    let doc = xml::parse_document(&text, path)?;
    doc.root_element()
        .children()
        .filter(|n| n.has_tag_name("tripinfo"))
        .map(|n| {
            let depart = required_number(&n, "depart", path)?;
            let arrival = required_number(&n, "arrival", path)?;
            Ok(TravelTimeRow {
                train_id: required(&n, "id", path)?.to_string(),
                depart,
                arrival,
                total_travel_time: arrival - depart,
                route_length: optional_number(&n, "routeLength", path)?.unwrap_or_default(),
                average_speed: optional_number(&n, "speed", path)?.unwrap_or_default(),
            })
        })
        .collect()
}

/// one row per `stopinfo` element of a simulator stop output.
pub fn read_stopinfo(path: &Path) -> Result<Vec<DwellTimeRow>, SumoFileError> {
    let text = fs::read_to_string(path)?;
    let doc = xml::parse_document(&text, path)?;
    doc.root_element()
        .children()
        .filter(|n| n.has_tag_name("stopinfo"))
        .map(|n| {
            let arrival_time = required_number(&n, "arrival", path)?;
            let departure_time = required_number(&n, "departure", path)?;
            Ok(DwellTimeRow {
                train_id: required(&n, "id", path)?.to_string(),
                stop_edge: required(&n, "edge", path)?.to_string(),
                arrival_time,
                departure_time,
                dwell_time: departure_time - arrival_time,
            })
        })
        .collect()
}

/// gaps between successive arrivals at each key stop, in order of arrival. key stops
/// are reported in the order given.
pub fn compute_headways(stops: &[DwellTimeRow], key_stops: &[String]) -> Vec<HeadwayRow> {
    let mut arrivals_by_edge: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for stop in stops.iter() {
        arrivals_by_edge
            .entry(stop.stop_edge.as_str())
            .or_default()
            .push(stop.arrival_time);
    }
    let mut headways = vec![];
    for key_stop in key_stops.iter() {
        let Some(arrivals) = arrivals_by_edge.get_mut(key_stop.as_str()) else {
            log::warn!("key stop '{key_stop}' has no recorded arrivals");
            continue;
        };
        arrivals.sort_by(f64::total_cmp);
        headways.extend(arrivals.windows(2).map(|w| HeadwayRow {
            station_edge: key_stop.clone(),
            arrival_time: w[1],
            headway_sec: w[1] - w[0],
        }));
    }
    headways
}

/// writes the KPI tables into `output_directory`. without a stop output only the travel
/// time table is written.
pub fn write_kpi_tables(
    tripinfo_file: &Path,
    stopinfo_file: Option<&Path>,
    key_stops: &[String],
    output_directory: &Path,
    overwrite: bool,
) -> Result<(), SumoFileError> {
    let travel_times = read_tripinfo(tripinfo_file)?;
    log::info!("parsed {} trips from '{}'", travel_times.len(), tripinfo_file.display());
    fs::serialize_into_csv(
        &travel_times,
        TRAVEL_TIME_FILENAME,
        output_directory,
        overwrite,
        "travel times",
    )?;

    let Some(stopinfo_file) = stopinfo_file.filter(|p| p.exists()) else {
        log::warn!("stop output not found, skipping dwell time and headway tables");
        return Ok(());
    };
    let dwell_times = read_stopinfo(stopinfo_file)?;
    log::info!("parsed {} stops from '{}'", dwell_times.len(), stopinfo_file.display());
    fs::serialize_into_csv(
        &dwell_times,
        DWELL_TIME_FILENAME,
        output_directory,
        overwrite,
        "dwell times",
    )?;
    let headways = compute_headways(&dwell_times, key_stops);
    fs::serialize_into_csv(
        &headways,
        HEADWAYS_FILENAME,
        output_directory,
        overwrite,
        "headways",
    )?;
    Ok(())
}

fn required<'a>(
    node: &roxmltree::Node<'a, '_>,
    attribute: &str,
    path: &Path,
) -> Result<&'a str, SumoFileError> {
    node.attribute(attribute).ok_or_else(|| SumoFileError::XmlError {
        path: path.to_owned(),
        message: format!(
            "'{}' element with id '{}' is missing attribute '{attribute}'",
            node.tag_name().name(),
            node.attribute("id").unwrap_or("?")
        ),
    })
}

fn required_number(
    node: &roxmltree::Node<'_, '_>,
    attribute: &str,
    path: &Path,
) -> Result<f64, SumoFileError> {
    let value = required(node, attribute, path)?;
    parse_number(value, attribute, path)
}

fn optional_number(
    node: &roxmltree::Node<'_, '_>,
    attribute: &str,
    path: &Path,
) -> Result<Option<f64>, SumoFileError> {
    node.attribute(attribute)
        .map(|value| parse_number(value, attribute, path))
        .transpose()
}

fn parse_number(value: &str, attribute: &str, path: &Path) -> Result<f64, SumoFileError> {
    value.parse::<f64>().map_err(|e| SumoFileError::XmlError {
        path: path.to_owned(),
        message: format!("attribute '{attribute}' has non-numeric value '{value}': {e}"),
    })
}
