use std::path::{Path, PathBuf};

use config::{Config, File};
use railmatch_core::{
    crs::Crs,
    matching::{
        AssemblyPolicy, ConnectivityPolicy, MatcherConfig, RevisitPolicy, TieBreakPolicy,
    },
};
use railmatch_sumo::routes::{RouteFileLayout, VehicleTemplate};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::app::RailMatchAppError;

/// everything a `match` run needs, read from a TOML file.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchConfiguration {
    pub topology: TopologyConfig,
    pub network: NetworkConfig,
    pub trips: TripSource,
    pub trip_options: TripOptions,
    pub matching: MatchingConfig,
    pub output: OutputConfig,
}

/// where the rail geometry comes from and how its columns are named.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TopologyConfig {
    pub edges_file: PathBuf,
    #[serde(default = "default_id_column")]
    pub id_column: String,
    #[serde(default = "default_geometry_column")]
    pub geometry_column: String,
    #[serde(default = "default_from_column")]
    pub from_column: String,
    #[serde(default = "default_to_column")]
    pub to_column: String,
    /// reference system of the edge geometries, must be projected
    #[serde(default = "default_topology_crs")]
    pub crs: Crs,
    /// apply the simulator id sanitization to the id column
    #[serde(default)]
    pub sanitize_ids: bool,
}

/// the compiled network providing the valid edge ids.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct NetworkConfig {
    /// a `.net.xml` file or a text file with one edge id per line
    pub net_file: PathBuf,
    #[serde(default)]
    pub include_internal_edges: bool,
}

/// where the trips and their stops come from.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TripSource {
    /// a GTFS `stops.txt` plus one CSV per trip listing its `stop_id`s in order
    StopSequences {
        stops_file: PathBuf,
        sequence_directory: PathBuf,
        #[serde(default = "default_file_suffix")]
        file_suffix: String,
    },
    /// a GTFS feed (zip archive or directory). one representative trip per route.
    Gtfs {
        feed: PathBuf,
        /// routes to include. all routes when empty.
        #[serde(default)]
        route_ids: Vec<String>,
    },
}

/// what to do with stops that have no coordinates.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MissingStopPolicy {
    /// reject the whole trip
    #[default]
    SkipTrip,
    /// drop the stop and match the remaining ones
    DropStop,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TripOptions {
    /// reference system of the stop coordinates
    #[serde(default = "default_trip_crs")]
    pub crs: Crs,
    #[serde(default)]
    pub missing_stop_policy: MissingStopPolicy,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MatchingConfig {
    /// maximum distance from stop to nearest edge, in topology units
    #[serde(default)]
    pub max_distance: Option<f64>,
    #[serde(default)]
    pub tie_break: TieBreakPolicy,
    #[serde(default)]
    pub connectivity: ConnectivityPolicy,
    #[serde(default)]
    pub revisits: RevisitPolicy,
    #[serde(default = "default_endpoint_tolerance")]
    pub endpoint_tolerance: f64,
    /// match trips on all available cores
    #[serde(default)]
    pub parallel: bool,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            max_distance: None,
            tie_break: TieBreakPolicy::default(),
            connectivity: ConnectivityPolicy::default(),
            revisits: RevisitPolicy::default(),
            endpoint_tolerance: default_endpoint_tolerance(),
            parallel: false,
        }
    }
}

impl MatchingConfig {
    pub fn matcher_config(&self) -> MatcherConfig {
        MatcherConfig {
            max_distance: self.max_distance,
            tie_break: self.tie_break,
        }
    }

    pub fn assembly_policy(&self) -> AssemblyPolicy {
        AssemblyPolicy {
            connectivity: self.connectivity,
            revisits: self.revisits,
            endpoint_tolerance: self.endpoint_tolerance,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct OutputConfig {
    pub directory: PathBuf,
    #[serde(default)]
    pub layout: RouteFileLayout,
    #[serde(default = "default_routes_filename")]
    pub routes_filename: String,
    #[serde(default = "default_vehicle_type")]
    pub vehicle_type: String,
    /// CSV with `route_id,vehicle_type` rows overriding `vehicle_type` per trip
    #[serde(default)]
    pub vehicle_type_mapping: Option<PathBuf>,
    #[serde(default)]
    pub depart: f64,
    #[serde(default = "default_summary_filename")]
    pub summary_filename: String,
    #[serde(default = "default_overwrite")]
    pub overwrite: bool,
}

impl OutputConfig {
    pub fn vehicle_template(&self) -> VehicleTemplate {
        VehicleTemplate::new(&self.vehicle_type, self.depart)
    }
}

impl TryFrom<&Path> for MatchConfiguration {
    type Error = RailMatchAppError;

    fn try_from(configuration_file: &Path) -> Result<Self, Self::Error> {
        let config = Config::builder()
            .add_source(File::from(configuration_file))
            .build()
            .map_err(|e| {
                let msg = format!(
                    "file '{}' produced error: {e}",
                    configuration_file.display()
                );
                RailMatchAppError::InvalidUserInput(msg)
            })?;
        let matching = match config.get::<MatchingConfig>("matching") {
            Ok(matching) => matching,
            Err(config::ConfigError::NotFound(_)) => MatchingConfig::default(),
            Err(e) => return Err(key_error("matching", configuration_file, e)),
        };
        let result = MatchConfiguration {
            topology: get_key(&config, "topology", configuration_file)?,
            network: get_key(&config, "network", configuration_file)?,
            trips: get_key(&config, "trips", configuration_file)?,
            trip_options: get_key(&config, "trips", configuration_file)?,
            matching,
            output: get_key(&config, "output", configuration_file)?,
        };
        Ok(result)
    }
}

fn get_key<T: DeserializeOwned>(
    config: &Config,
    key: &str,
    configuration_file: &Path,
) -> Result<T, RailMatchAppError> {
    config
        .get::<T>(key)
        .map_err(|e| key_error(key, configuration_file, e))
}

fn key_error(key: &str, configuration_file: &Path, e: config::ConfigError) -> RailMatchAppError {
    let msg = format!(
        "error reading '{key}' in '{}': {e}",
        configuration_file.display()
    );
    RailMatchAppError::InvalidUserInput(msg)
}

fn default_id_column() -> String {
    String::from("edge_id")
}

fn default_geometry_column() -> String {
    String::from("geometry")
}

fn default_from_column() -> String {
    String::from("from_node")
}

fn default_to_column() -> String {
    String::from("to_node")
}

fn default_topology_crs() -> Crs {
    Crs::Lv95
}

fn default_trip_crs() -> Crs {
    Crs::Wgs84
}

fn default_file_suffix() -> String {
    String::from("_stops.csv")
}

fn default_endpoint_tolerance() -> f64 {
    1.0
}

fn default_routes_filename() -> String {
    String::from("mapped_routes.rou.xml")
}

fn default_vehicle_type() -> String {
    String::from("IC")
}

fn default_summary_filename() -> String {
    String::from("match_summary.json")
}

fn default_overwrite() -> bool {
    true
}
