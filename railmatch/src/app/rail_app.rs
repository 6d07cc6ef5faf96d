use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use railmatch_sumo::{kpi, net, sumocfg::SimulationConfig, validate, vtypes};
use serde::{Deserialize, Serialize};

use crate::app::{match_run, network, MatchConfiguration, RailMatchAppError};

/// Command line tool mapping scheduled rail stops onto the edges of a compiled
/// simulation network and preparing the simulator's inputs and outputs.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct RailMatchApp {
    #[command(subcommand)]
    pub op: RailMatchOperation,
}

#[derive(Debug, Clone, Serialize, Deserialize, Subcommand)]
pub enum RailMatchOperation {
    /// match trip stops to rail edges and write simulator route files
    Match {
        /// TOML file describing topology, network, trips, matching and output
        #[arg(short, long)]
        configuration_file: String,
    },
    /// convert node and edge tables into plain network files for the network compiler
    BuildNetwork {
        /// CSV with node_id, x and y columns
        #[arg(long)]
        nodes_file: String,
        /// CSV with an id column, from_node, to_node and an optional WKT geometry column
        #[arg(long)]
        edges_file: String,
        #[arg(long, default_value = "edge_id")]
        id_column: String,
        #[arg(short, long)]
        output_directory: String,
        /// file name prefix of the written network files
        #[arg(short, long)]
        name: String,
    },
    /// report route edges that are missing from the compiled network
    ValidateRoutes {
        /// compiled network (.net.xml) or a text file with one edge id per line
        #[arg(long)]
        net_file: String,
        /// directory containing *.rou.xml files
        #[arg(long)]
        route_directory: String,
        /// count internal junction edges as valid
        #[arg(long)]
        include_internal_edges: bool,
    },
    /// write a simulation configuration file for all route files of a directory
    SumoConfig {
        #[arg(long)]
        net_file: String,
        #[arg(long)]
        route_directory: String,
        #[arg(short, long)]
        output_file: String,
        #[arg(long)]
        additional_file: Vec<String>,
        /// simulation start, in seconds
        #[arg(long, default_value_t = 0.0)]
        begin: f64,
        /// simulation end, in seconds
        #[arg(long, default_value_t = 3600.0)]
        end: f64,
        #[arg(long)]
        tripinfo_output: Option<String>,
        #[arg(long)]
        stop_output: Option<String>,
        /// skip route files whose name contains this pattern
        #[arg(long)]
        exclude: Vec<String>,
    },
    /// compute travel time, dwell time and headway tables from simulator outputs
    Kpi {
        #[arg(long)]
        tripinfo_file: String,
        #[arg(long)]
        stopinfo_file: Option<String>,
        #[arg(short, long)]
        output_directory: String,
        /// edge id of a station to compute headways for
        #[arg(long)]
        key_stop: Vec<String>,
        /// keep tables that already exist in the output directory
        #[arg(long)]
        skip_existing: bool,
    },
    /// write rail vehicle type definitions for the simulator
    VehicleTypes {
        /// CSV with vehicle_type, length_m, max_speed_kmh, person_capacity, accel and decel
        /// columns. without it, intercity and interregio types are written
        #[arg(long)]
        profile_file: Option<String>,
        #[arg(short, long)]
        output_file: String,
        #[arg(long)]
        skip_existing: bool,
    },
}

impl RailMatchOperation {
    pub fn run(&self) -> Result<(), RailMatchAppError> {
        match self {
            RailMatchOperation::Match { configuration_file } => {
                let conf = MatchConfiguration::try_from(Path::new(configuration_file))?;
                match_run::run(&conf)?;
                Ok(())
            }
            RailMatchOperation::BuildNetwork {
                nodes_file,
                edges_file,
                id_column,
                output_directory,
                name,
            } => {
                network::run(
                    Path::new(nodes_file),
                    Path::new(edges_file),
                    id_column,
                    Path::new(output_directory),
                    name,
                    true,
                )?;
                Ok(())
            }
            RailMatchOperation::ValidateRoutes {
                net_file,
                route_directory,
                include_internal_edges,
            } => {
                let valid_edges =
                    net::load_valid_edge_set(Path::new(net_file), *include_internal_edges)?;
                let report =
                    validate::validate_route_directory(Path::new(route_directory), &valid_edges)?;
                log::info!(
                    "checked {} vehicles in {} files, {} invalid edge references",
                    report.vehicles_checked,
                    report.files_checked,
                    report.invalid.len()
                );
                Ok(())
            }
            RailMatchOperation::SumoConfig {
                net_file,
                route_directory,
                output_file,
                additional_file,
                begin,
                end,
                tripinfo_output,
                stop_output,
                exclude,
            } => {
                let mut config = SimulationConfig::from_route_directory(
                    Path::new(net_file),
                    Path::new(route_directory),
                    exclude,
                )?;
                config.additional_files = additional_file.iter().map(PathBuf::from).collect();
                config.begin = *begin;
                config.end = *end;
                config.tripinfo_output = tripinfo_output.as_ref().map(PathBuf::from);
                config.stop_output = stop_output.as_ref().map(PathBuf::from);
                config.write(Path::new(output_file))?;
                Ok(())
            }
            RailMatchOperation::Kpi {
                tripinfo_file,
                stopinfo_file,
                output_directory,
                key_stop,
                skip_existing,
            } => {
                kpi::write_kpi_tables(
                    Path::new(tripinfo_file),
                    stopinfo_file.as_ref().map(Path::new),
                    key_stop,
                    Path::new(output_directory),
                    !skip_existing,
                )?;
                Ok(())
            }
            RailMatchOperation::VehicleTypes {
                profile_file,
                output_file,
                skip_existing,
            } => {
                let types = match profile_file {
                    Some(file) => vtypes::read_vehicle_profiles(Path::new(file))?,
                    None => vtypes::default_vehicle_types(),
                };
                if types.is_empty() {
                    let msg = format!(
                        "no vehicle types found in '{}'",
                        profile_file.as_deref().unwrap_or_default()
                    );
                    return Err(RailMatchAppError::InvalidUserInput(msg));
                }
                vtypes::write_vehicle_types(Path::new(output_file), &types, !skip_existing)?;
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sumo_config_arguments() {
        let app = RailMatchApp::try_parse_from([
            "railmatch",
            "sumo-config",
            "--net-file",
            "rail.net.xml",
            "--route-directory",
            "mapped_rou",
            "--output-file",
            "rail.sumocfg",
            "--end",
            "10000",
            "--exclude",
            "91-29",
            "--exclude",
            "2-28",
        ])
        .unwrap();
        match app.op {
            RailMatchOperation::SumoConfig {
                begin, end, exclude, ..
            } => {
                assert_eq!(begin, 0.0);
                assert_eq!(end, 10000.0);
                assert_eq!(exclude, vec!["91-29", "2-28"]);
            }
            other => panic!("unexpected operation {other:?}"),
        }
    }

    #[test]
    fn test_validate_routes_reports_without_failing() {
        let dir = tempfile::tempdir().unwrap();
        let net_file = dir.path().join("edges.txt");
        std::fs::write(&net_file, "e1\n").unwrap();
        let routes = dir.path().join("routes");
        std::fs::create_dir(&routes).unwrap();
        std::fs::write(
            routes.join("a.rou.xml"),
            r#"<routes><vehicle id="v" type="IC" depart="0"><route edges="e1 e9"/></vehicle></routes>"#,
        )
        .unwrap();
        let op = RailMatchOperation::ValidateRoutes {
            net_file: net_file.display().to_string(),
            route_directory: routes.display().to_string(),
            include_internal_edges: false,
        };
        assert!(op.run().is_ok());
    }

    #[test]
    fn test_kpi_without_stop_output() {
        let dir = tempfile::tempdir().unwrap();
        let tripinfo = dir.path().join("tripinfo.xml");
        std::fs::write(
            &tripinfo,
            r#"<tripinfos><tripinfo id="IC1" depart="0" arrival="60"/></tripinfos>"#,
        )
        .unwrap();
        let out = dir.path().join("kpi");
        let op = RailMatchOperation::Kpi {
            tripinfo_file: tripinfo.display().to_string(),
            stopinfo_file: None,
            output_directory: out.display().to_string(),
            key_stop: vec![],
            skip_existing: false,
        };
        op.run().unwrap();
        assert!(out.join(kpi::TRAVEL_TIME_FILENAME).exists());
    }

    #[test]
    fn test_vehicle_types_from_profile() {
        let dir = tempfile::tempdir().unwrap();
        let profile = dir.path().join("vehicle_profile_table.csv");
        std::fs::write(&profile, "vehicle_type,max_speed_kmh
RABe 511,160
").unwrap();
        let output = dir.path().join("vehicle_types.veh.xml");
        let app = RailMatchApp::try_parse_from([
            "railmatch",
            "vehicle-types",
            "--profile-file",
            profile.to_str().unwrap(),
            "--output-file",
            output.to_str().unwrap(),
        ])
        .unwrap();
        app.op.run().unwrap();
        assert_eq!(vtypes::read_vehicle_type_ids(&output).unwrap(), vec!["RABe_511"]);
    }
}
