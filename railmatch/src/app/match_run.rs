use std::path::{Path, PathBuf};

use kdam::tqdm;
use railmatch_core::{
    crs::CoordinateNormalizer,
    matching::{EdgeMatcher, RejectionReason, RouteAssembler, RouteMapper, TripReport},
    model::MatchedRoute,
    summary::RunSummary,
};
use railmatch_sumo::{net, routes, util::fs::create_writer, vtypes};
use rayon::prelude::*;

use super::{MatchConfiguration, MissingStopPolicy, RailMatchAppError, TripSource};
use crate::input::{self, TripInput};

/// what a `match` run produced.
#[derive(Debug, Clone)]
pub struct MatchRunOutput {
    pub summary: RunSummary,
    pub route_files: Vec<PathBuf>,
    pub summary_file: PathBuf,
}

/// loads the topology and the compiled network, maps every trip onto rail edges and
/// writes the route files and the run summary.
pub fn run(conf: &MatchConfiguration) -> Result<MatchRunOutput, RailMatchAppError> {
    let (topology, load_report) = input::load_topology(&conf.topology)?;
    let valid_edges =
        net::load_valid_edge_set(&conf.network.net_file, conf.network.include_internal_edges)?;
    let normalizer = CoordinateNormalizer::new(conf.trip_options.crs, topology.crs())?;
    let matcher = EdgeMatcher::new(&topology, &valid_edges, conf.matching.matcher_config());
    let assembler = RouteAssembler::new(conf.matching.assembly_policy());
    let mapper = RouteMapper::new(matcher, assembler, normalizer)?;

    let trips = read_trips(&conf.trips)?;
    let reports = map_trips(
        &mapper,
        &trips,
        conf.trip_options.missing_stop_policy,
        conf.matching.parallel,
    )?;

    let accepted = reports
        .iter()
        .filter_map(|r| r.outcome.route())
        .collect::<Vec<&MatchedRoute>>();
    let mut template = conf.output.vehicle_template();
    if let Some(mapping_file) = &conf.output.vehicle_type_mapping {
        template.type_by_trip = vtypes::read_vehicle_type_mapping(mapping_file)?;
    }
    let route_files = routes::write_route_files(
        &conf.output.directory,
        &conf.output.routes_filename,
        conf.output.layout,
        &accepted,
        &template,
        conf.output.overwrite,
    )?;
    log::info!(
        "wrote {} routes into {} files in '{}'",
        accepted.len(),
        route_files.len(),
        conf.output.directory.display()
    );

    let summary = RunSummary::new(reports.iter(), &load_report, valid_edges.len());
    let summary_file = conf.output.directory.join(&conf.output.summary_filename);
    write_summary(&summary, &summary_file, conf.output.overwrite)?;
    log_summary(&summary);
    Ok(MatchRunOutput {
        summary,
        route_files,
        summary_file,
    })
}

fn read_trips(source: &TripSource) -> Result<Vec<TripInput>, RailMatchAppError> {
    match source {
        TripSource::StopSequences {
            stops_file,
            sequence_directory,
            file_suffix,
        } => input::read_stop_sequence_trips(stops_file, sequence_directory, file_suffix),
        TripSource::Gtfs { feed, route_ids } => input::read_gtfs_trips(feed, route_ids),
    }
}

/// one report per trip, in input order, regardless of parallel execution.
fn map_trips(
    mapper: &RouteMapper,
    trips: &[TripInput],
    missing_stop_policy: MissingStopPolicy,
    parallel: bool,
) -> Result<Vec<TripReport>, RailMatchAppError> {
    let map_one = |input: &TripInput| map_trip(mapper, input, missing_stop_policy);
    let reports = if parallel {
        log::info!(
            "mapping {} trips on {} threads",
            trips.len(),
            rayon::current_num_threads()
        );
        trips.par_iter().map(map_one).collect::<Result<Vec<_>, _>>()?
    } else {
        tqdm!(trips.iter(), total = trips.len(), desc = "map trips")
            .map(map_one)
            .collect::<Result<Vec<_>, _>>()?
    };
    if !parallel {
        eprintln!();
    }
    Ok(reports)
}

fn map_trip(
    mapper: &RouteMapper,
    input: &TripInput,
    missing_stop_policy: MissingStopPolicy,
) -> Result<TripReport, RailMatchAppError> {
    let TripInput {
        trip,
        missing_stops,
    } = input;
    if missing_stops.is_empty() {
        return Ok(mapper.map_trip(trip)?);
    }
    match missing_stop_policy {
        MissingStopPolicy::SkipTrip => {
            log::warn!(
                "trip '{}': {} stops without coordinates, skipping trip",
                trip.id,
                missing_stops.len()
            );
            let report = TripReport::rejected(
                &trip.id,
                trip.stops.len(),
                RejectionReason::MissingStopCoordinates,
            );
            Ok(report.with_missing_stops(missing_stops))
        }
        MissingStopPolicy::DropStop => {
            log::warn!(
                "trip '{}': dropping stops without coordinates [{}]",
                trip.id,
                missing_stops.join(", ")
            );
            Ok(mapper.map_trip(trip)?.with_missing_stops(missing_stops))
        }
    }
}

fn write_summary(
    summary: &RunSummary,
    path: &Path,
    overwrite: bool,
) -> Result<(), RailMatchAppError> {
    let Some(writer) = create_writer(path, overwrite)? else {
        return Ok(());
    };
    serde_json::to_writer_pretty(writer, summary).map_err(|e| RailMatchAppError::WriteError {
        path: path.to_owned(),
        message: format!("failure serializing run summary: {e}"),
    })?;
    log::info!("run summary written to '{}'", path.display());
    Ok(())
}

fn log_summary(summary: &RunSummary) {
    log::info!(
        "processed {} trips: {} accepted, {} rejected",
        summary.trips_processed,
        summary.trips_accepted,
        summary.trips_rejected
    );
    for (reason, count) in summary.most_common_rejections(5) {
        log::info!("  rejected ({reason}): {count}");
    }
    log::info!(
        "dropped {} of {} stops",
        summary.points_dropped,
        summary.points_total
    );
    for (reason, count) in summary.dropped_points_by_reason.iter() {
        log::info!("  dropped ({reason}): {count}");
    }
    if summary.disconnected_jumps > 0 {
        log::warn!(
            "{} consecutive edge pairs in accepted routes do not touch",
            summary.disconnected_jumps
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{MatchingConfig, NetworkConfig, OutputConfig, TopologyConfig, TripOptions};
    use railmatch_core::crs::Crs;
    use railmatch_sumo::routes::{read_route_file, RouteFileLayout};

    /// two touching edges along the x axis near Bern in LV95 and a compiled network that
    /// lacks a third, far away edge.
    fn fixture(dir: &Path) -> MatchConfiguration {
        std::fs::write(
            dir.join("rail_edges.csv"),
            "edge_id,from_node,to_node,geometry\n\
             e1,n1,n2,\"LINESTRING (2600000 1200000, 2601000 1200000)\"\n\
             e2,n2,n3,\"LINESTRING (2601000 1200000, 2602000 1200000)\"\n\
             e3,n4,n5,\"LINESTRING (2600000 1205000, 2602000 1205000)\"\n\
             e4,n5,n6,\n",
        )
        .unwrap();
        std::fs::write(dir.join("edges.txt"), "e1\ne2\n").unwrap();
        std::fs::write(
            dir.join("stops.txt"),
            "stop_id,stop_lat,stop_lon\n\
             a,1200010,2600100\n\
             b,1199990,2601500\n\
             c,1205010,2601000\n\
             d,,\n",
        )
        .unwrap();
        let seq = dir.join("stop_sequences");
        std::fs::create_dir(&seq).unwrap();
        std::fs::write(seq.join("T1_stops.csv"), "stop_id\na\nb\n").unwrap();
        std::fs::write(seq.join("T2_stops.csv"), "stop_id\na\nc\n").unwrap();
        std::fs::write(seq.join("T3_stops.csv"), "stop_id\na\nd\nb\n").unwrap();

        MatchConfiguration {
            topology: TopologyConfig {
                edges_file: dir.join("rail_edges.csv"),
                id_column: String::from("edge_id"),
                geometry_column: String::from("geometry"),
                from_column: String::from("from_node"),
                to_column: String::from("to_node"),
                crs: Crs::Lv95,
                sanitize_ids: false,
            },
            network: NetworkConfig {
                net_file: dir.join("edges.txt"),
                include_internal_edges: false,
            },
            trips: TripSource::StopSequences {
                stops_file: dir.join("stops.txt"),
                sequence_directory: seq,
                file_suffix: String::from("_stops.csv"),
            },
            trip_options: TripOptions {
                crs: Crs::Lv95,
                missing_stop_policy: MissingStopPolicy::SkipTrip,
            },
            matching: MatchingConfig::default(),
            output: OutputConfig {
                directory: dir.join("out"),
                layout: RouteFileLayout::Single,
                routes_filename: String::from("mapped_routes.rou.xml"),
                vehicle_type: String::from("IC"),
                vehicle_type_mapping: None,
                depart: 0.0,
                summary_filename: String::from("match_summary.json"),
                overwrite: true,
            },
        }
    }

    #[test]
    fn test_match_run_writes_routes_and_summary() {
        let dir = tempfile::tempdir().unwrap();
        let conf = fixture(dir.path());
        let output = run(&conf).unwrap();

        assert_eq!(output.summary.trips_processed, 3);
        assert_eq!(output.summary.trips_accepted, 1);
        assert_eq!(output.summary.trips_rejected, 2);
        assert_eq!(output.summary.topology.edges_loaded, 3);
        assert_eq!(output.summary.topology.records_dropped, 1);
        assert_eq!(
            output.summary.rejection_reasons.get("insufficient valid edges"),
            Some(&1)
        );
        assert_eq!(
            output.summary.rejection_reasons.get("missing stop coordinates"),
            Some(&1)
        );
        assert_eq!(output.summary.dropped_points_by_reason.get("edge not in compiled network"), Some(&1));

        assert_eq!(output.route_files, vec![dir.path().join("out/mapped_routes.rou.xml")]);
        let vehicles = read_route_file(&output.route_files[0]).unwrap();
        assert_eq!(vehicles.len(), 1);
        assert_eq!(vehicles[0].vehicle_id, "T1");
        assert_eq!(vehicles[0].edges, vec!["e1", "e2"]);

        let json = std::fs::read_to_string(&output.summary_file).unwrap();
        let parsed: RunSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.trips_accepted, 1);
    }

    #[test]
    fn test_drop_stop_policy_and_parallel_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut conf = fixture(dir.path());
        conf.trip_options.missing_stop_policy = MissingStopPolicy::DropStop;
        conf.matching.parallel = true;
        conf.output.layout = RouteFileLayout::PerTrip;
        let output = run(&conf).unwrap();

        assert_eq!(output.summary.trips_accepted, 2);
        assert_eq!(
            output.summary.dropped_points_by_reason.get("missing coordinate"),
            Some(&1)
        );
        let names = output
            .route_files
            .iter()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()))
            .collect::<Vec<_>>();
        assert_eq!(
            names,
            vec!["mapped_routes_T1.rou.xml", "mapped_routes_T3.rou.xml"]
        );
    }

    #[test]
    fn test_mismatched_trip_crs_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut conf = fixture(dir.path());
        conf.trip_options.crs = Crs::UtmNorth(32);
        assert!(matches!(run(&conf), Err(RailMatchAppError::MatchError(_))));
    }

    #[test]
    fn test_rerun_keeps_existing_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let mut conf = fixture(dir.path());
        let output = run(&conf).unwrap();
        std::fs::write(&output.summary_file, "{}").unwrap();

        conf.output.overwrite = false;
        let rerun = run(&conf).unwrap();
        assert_eq!(std::fs::read_to_string(&rerun.summary_file).unwrap(), "{}");

        conf.output.overwrite = true;
        let rerun = run(&conf).unwrap();
        let json = std::fs::read_to_string(&rerun.summary_file).unwrap();
        assert!(json.contains("\"trips_accepted\": 1"));
    }

    #[test]
    fn test_vehicle_type_mapping_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut conf = fixture(dir.path());
        let mapping = dir.path().join("vehicle_type_mapping.csv");
        std::fs::write(&mapping, "route_id,vehicle_type
T1,ir_single_deck
").unwrap();
        conf.output.vehicle_type_mapping = Some(mapping);
        let output = run(&conf).unwrap();
        let xml = std::fs::read_to_string(&output.route_files[0]).unwrap();
        assert!(xml.contains("id=\"T1\" type=\"ir_single_deck\""));
    }
}
