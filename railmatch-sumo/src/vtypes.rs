use std::{collections::HashMap, path::Path};

use serde::{Deserialize, Serialize};

use crate::{util::fs, xml, xml::XmlWriter, SumoFileError};

const DEFAULT_MAX_SPEED_KMH: f64 = 160.0;
const DEFAULT_LENGTH_M: f64 = 10.0;
const DEFAULT_PERSON_CAPACITY: u32 = 300;
const DEFAULT_ACCEL: f64 = 0.8;
const DEFAULT_DECEL: f64 = 1.0;
const DEFAULT_SIGMA: f64 = 0.5;

/// a rail vehicle type as the simulator reads it from a `vType` element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleType {
    pub id: String,
    /// meters
    pub length: f64,
    /// meters per second
    pub max_speed: f64,
    pub accel: f64,
    pub decel: f64,
    pub sigma: f64,
    pub person_capacity: u32,
}

/// one row of a rolling stock profile table. only `vehicle_type` is required.
#[derive(Debug, Clone, Deserialize)]
struct VehicleProfileRow {
    vehicle_type: String,
    #[serde(default)]
    length_m: Option<f64>,
    #[serde(default)]
    max_speed_kmh: Option<f64>,
    #[serde(default)]
    person_capacity: Option<u32>,
    #[serde(default)]
    accel: Option<f64>,
    #[serde(default)]
    decel: Option<f64>,
}

impl From<VehicleProfileRow> for VehicleType {
    fn from(row: VehicleProfileRow) -> Self {
        let max_speed_kmh = row.max_speed_kmh.unwrap_or(DEFAULT_MAX_SPEED_KMH);
        Self {
            id: row.vehicle_type.trim().replace(' ', "_"),
            length: row.length_m.unwrap_or(DEFAULT_LENGTH_M),
            max_speed: max_speed_kmh / 3.6,
            accel: row.accel.unwrap_or(DEFAULT_ACCEL),
            decel: row.decel.unwrap_or(DEFAULT_DECEL),
            sigma: DEFAULT_SIGMA,
            person_capacity: row.person_capacity.unwrap_or(DEFAULT_PERSON_CAPACITY),
        }
    }
}

/// intercity (200 km/h, 200 m) and interregio (160 km/h, 150 m) trains, used when no
/// profile table is given.
pub fn default_vehicle_types() -> Vec<VehicleType> {
    vec![
        VehicleType {
            id: String::from("IC"),
            length: 200.0,
            max_speed: 200.0 / 3.6,
            accel: 1.0,
            decel: 1.0,
            sigma: DEFAULT_SIGMA,
            person_capacity: DEFAULT_PERSON_CAPACITY,
        },
        VehicleType {
            id: String::from("IR"),
            length: 150.0,
            max_speed: 160.0 / 3.6,
            accel: 1.0,
            decel: 1.0,
            sigma: DEFAULT_SIGMA,
            person_capacity: DEFAULT_PERSON_CAPACITY,
        },
    ]
}

/// reads a profile table with columns `vehicle_type`, `length_m`, `max_speed_kmh`,
/// `person_capacity`, `accel` and `decel`. empty cells take the defaults.
pub fn read_vehicle_profiles(path: &Path) -> Result<Vec<VehicleType>, SumoFileError> {
    let text = fs::read_to_string(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());
    let types = reader
        .deserialize::<VehicleProfileRow>()
        .enumerate()
        .map(|(idx, row)| {
            row.map(VehicleType::from)
                .map_err(|e| SumoFileError::ReadError {
                    path: path.to_owned(),
                    message: format!("row {}: {e}", idx + 1),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;
    log::info!("read {} vehicle profiles from '{}'", types.len(), path.display());
    Ok(types)
}

/// reads a `route_id,vehicle_type` table assigning vehicle types to trips.
pub fn read_vehicle_type_mapping(path: &Path) -> Result<HashMap<String, String>, SumoFileError> {
    #[derive(Deserialize)]
    struct Row {
        route_id: String,
        vehicle_type: String,
    }
    let text = fs::read_to_string(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());
    let mut mapping = HashMap::new();
    for (idx, row) in reader.deserialize::<Row>().enumerate() {
        let row = row.map_err(|e| SumoFileError::ReadError {
            path: path.to_owned(),
            message: format!("row {}: {e}", idx + 1),
        })?;
        if let Some(previous) = mapping.insert(row.route_id.clone(), row.vehicle_type) {
            log::warn!(
                "route '{}' is mapped more than once, replacing vehicle type '{previous}'",
                row.route_id
            );
        }
    }
    Ok(mapping)
}

/// writes the types as `vType` elements of a `vehicleTypes` file. returns false when the
/// file already existed and `overwrite` is disabled.
pub fn write_vehicle_types(
    path: &Path,
    types: &[VehicleType],
    overwrite: bool,
) -> Result<bool, SumoFileError> {
    let Some(file) = fs::create_writer(path, overwrite)? else {
        return Ok(false);
    };
    let mut writer = XmlWriter::new(file, path)?;
    writer.start("vehicleTypes", &[])?;
    for vtype in types.iter() {
        let length = format!("{:.2}", vtype.length);
        let max_speed = format!("{:.2}", vtype.max_speed);
        let accel = vtype.accel.to_string();
        let decel = vtype.decel.to_string();
        let sigma = vtype.sigma.to_string();
        let capacity = vtype.person_capacity.to_string();
        writer.empty(
            "vType",
            &[
                ("id", vtype.id.as_str()),
                ("vClass", "rail"),
                ("accel", accel.as_str()),
                ("decel", decel.as_str()),
                ("sigma", sigma.as_str()),
                ("length", length.as_str()),
                ("maxSpeed", max_speed.as_str()),
                ("personCapacity", capacity.as_str()),
            ],
        )?;
    }
    writer.finish()?;
    log::info!("wrote {} vehicle types to '{}'", types.len(), path.display());
    Ok(true)
}

/// ids of all `vType` elements in a file.
pub fn read_vehicle_type_ids(path: &Path) -> Result<Vec<String>, SumoFileError> {
    let text = fs::read_to_string(path)?;
    let doc = xml::parse_document(&text, path)?;
    let ids = doc
        .descendants()
        .filter(|n| n.has_tag_name("vType"))
        .filter_map(|n| n.attribute("id"))
        .map(String::from)
        .collect();
    Ok(ids)
}
