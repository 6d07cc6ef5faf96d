use std::{
    collections::{HashMap, HashSet},
    io::Write,
    path::{Path, PathBuf},
};

use railmatch_core::model::MatchedRoute;
use serde::{Deserialize, Serialize};

use crate::{util::fs, xml, xml::XmlWriter, SumoFileError};

const ROUTE_FILE_SUFFIX: &str = ".rou.xml";

/// how accepted routes are distributed over route files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteFileLayout {
    /// all vehicles in one file
    #[default]
    Single,
    /// one file per trip, named after the trip
    PerTrip,
}

/// attributes shared by every generated vehicle. `type_by_trip` assigns another
/// vehicle type to individual trips.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleTemplate {
    pub vehicle_type: String,
    pub depart: f64,
    #[serde(default)]
    pub type_by_trip: HashMap<String, String>,
}

impl VehicleTemplate {
    pub fn new(vehicle_type: &str, depart: f64) -> Self {
        Self {
            vehicle_type: vehicle_type.to_string(),
            depart,
            type_by_trip: HashMap::new(),
        }
    }

    pub fn vehicle_type_for(&self, trip_id: &str) -> &str {
        self.type_by_trip
            .get(trip_id)
            .map(String::as_str)
            .unwrap_or(self.vehicle_type.as_str())
    }
}

/// a vehicle and the edges of its route as read back from a route file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VehicleRoute {
    pub vehicle_id: String,
    pub edges: Vec<String>,
}

/// writes `routes` as vehicles into a single route file. returns false when the file
/// already existed and `overwrite` is disabled.
pub fn write_route_file(
    path: &Path,
    routes: &[&MatchedRoute],
    template: &VehicleTemplate,
    overwrite: bool,
) -> Result<bool, SumoFileError> {
    let Some(file) = fs::create_writer(path, overwrite)? else {
        return Ok(false);
    };
    write_routes(file, path, routes, template)?;
    Ok(true)
}

/// writes route files for `routes` into `directory` following `layout`. per-trip files
/// are named `<stem>_<trip id>.rou.xml`, where `<stem>` is `filename` without its
/// `.rou.xml` suffix. trip ids that become the same file name get a numeric suffix
/// (`<stem>_<trip id>_2.rou.xml`). returns the paths written.
pub fn write_route_files(
    directory: &Path,
    filename: &str,
    layout: RouteFileLayout,
    routes: &[&MatchedRoute],
    template: &VehicleTemplate,
    overwrite: bool,
) -> Result<Vec<PathBuf>, SumoFileError> {
    fs::create_dirs(directory)?;
    let mut written = vec![];
    match layout {
        RouteFileLayout::Single => {
            let path = directory.join(filename);
            if write_route_file(&path, routes, template, overwrite)? {
                written.push(path);
            }
        }
        RouteFileLayout::PerTrip => {
            let stem = filename.strip_suffix(ROUTE_FILE_SUFFIX).unwrap_or(filename);
            let mut used_names = HashSet::new();
            for route in routes.iter().copied() {
                let base = format!("{stem}_{}", filename_safe(route.trip_id()));
                let mut name = format!("{base}{ROUTE_FILE_SUFFIX}");
                let mut counter = 2;
                while !used_names.insert(name.clone()) {
                    name = format!("{base}_{counter}{ROUTE_FILE_SUFFIX}");
                    counter += 1;
                }
                if counter > 2 {
                    log::warn!(
                        "trip '{}' shares its file name with another trip, writing '{name}'",
                        route.trip_id()
                    );
                }
                let path = directory.join(name);
                if write_route_file(&path, &[route], template, overwrite)? {
                    written.push(path);
                }
            }
        }
    }
    Ok(written)
}

fn write_routes<W: Write>(
    inner: W,
    path: &Path,
    routes: &[&MatchedRoute],
    template: &VehicleTemplate,
) -> Result<(), SumoFileError> {
    let depart = template.depart.to_string();
    let mut writer = XmlWriter::new(inner, path)?;
    writer.start("routes", &[])?;
    for route in routes.iter() {
        writer.start(
            "vehicle",
            &[
                ("id", route.trip_id()),
                ("type", template.vehicle_type_for(route.trip_id())),
                ("depart", depart.as_str()),
            ],
        )?;
        let edges = route.edges_attribute();
        writer.empty("route", &[("edges", edges.as_str())])?;
        writer.end()?;
    }
    writer.finish()?;
    Ok(())
}

/// reads all vehicles of a route file with their route edges. routes may be nested in
/// the vehicle or referenced by id from a top-level `route` element. vehicles without
/// any route are returned with no edges.
pub fn read_route_file(path: &Path) -> Result<Vec<VehicleRoute>, SumoFileError> {
    let text = fs::read_to_string(path)?;
    let doc = xml::parse_document(&text, path)?;
    let named_routes = doc
        .root_element()
        .children()
        .filter(|n| n.has_tag_name("route"))
        .filter_map(|n| Some((n.attribute("id")?, n.attribute("edges")?)))
        .collect::<HashMap<_, _>>();

    let vehicles = doc
        .descendants()
        .filter(|n| n.has_tag_name("vehicle"))
        .map(|vehicle| {
            let vehicle_id = vehicle.attribute("id").unwrap_or("unknown").to_string();
            let nested = vehicle
                .descendants()
                .filter(|n| n.has_tag_name("route"))
                .filter_map(|n| n.attribute("edges"))
                .collect::<Vec<_>>();
            let referenced = vehicle
                .attribute("route")
                .and_then(|id| named_routes.get(id).copied());
            let edges = nested
                .into_iter()
                .chain(referenced)
                .flat_map(str::split_whitespace)
                .map(String::from)
                .collect();
            VehicleRoute { vehicle_id, edges }
        })
        .collect();
    Ok(vehicles)
}

/// every `*.rou.xml` file in `directory`, sorted by name.
pub fn list_route_files(directory: &Path) -> Result<Vec<PathBuf>, SumoFileError> {
    let entries = std::fs::read_dir(directory).map_err(|e| SumoFileError::ReadError {
        path: directory.to_owned(),
        message: e.to_string(),
    })?;
    let mut files = vec![];
    for entry in entries {
        let entry = entry.map_err(|e| SumoFileError::ReadError {
            path: directory.to_owned(),
            message: e.to_string(),
        })?;
        let path = entry.path();
        let is_route_file = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.ends_with(ROUTE_FILE_SUFFIX))
            .unwrap_or_default();
        if is_route_file && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// trip ids may contain path separators or other characters unfit for file names.
fn filename_safe(trip_id: &str) -> String {
    trip_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use railmatch_core::{
        crs::{CoordinateNormalizer, Crs},
        matching::{EdgeMatcher, MatcherConfig, RouteAssembler, RouteMapper},
        model::{EdgeRecord, Stop, Topology, Trip, ValidEdgeSet},
    };

    /// matched routes can only be produced by the matching pipeline.
    fn mapped(trips: Vec<Trip>) -> Vec<MatchedRoute> {
        let records = [
            ("e1", "LINESTRING (0 0, 10 0)"),
            ("e2", "LINESTRING (10 0, 20 0)"),
            ("e3", "LINESTRING (20 0, 30 0)"),
        ]
        .iter()
        .map(|(id, wkt)| EdgeRecord {
            id: id.to_string(),
            geometry: Some(wkt.to_string()),
            from_node: None,
            to_node: None,
        })
        .collect::<Vec<_>>();
        let topology = Topology::from_records(Crs::Lv95, records).unwrap().0;
        let valid = ValidEdgeSet::new(["e1", "e2", "e3"]).unwrap();
        let mapper = RouteMapper::new(
            EdgeMatcher::new(&topology, &valid, MatcherConfig::default()),
            RouteAssembler::default(),
            CoordinateNormalizer::new(Crs::Lv95, Crs::Lv95).unwrap(),
        )
        .unwrap();
        trips
            .iter()
            .filter_map(|t| mapper.map_trip(t).unwrap().outcome.route().cloned())
            .collect()
    }

    fn routes() -> Vec<MatchedRoute> {
        mapped(vec![
            Trip::new("91-1", vec![Stop::new("a", 1.0, 1.0), Stop::new("b", 11.0, 1.0)]),
            Trip::new(
                "S/2",
                vec![Stop::new("c", 21.0, 1.0), Stop::new("d", 11.0, 1.0)],
            ),
        ])
    }

    fn template() -> VehicleTemplate {
        VehicleTemplate::new("IC", 0.0)
    }

    #[test]
    fn test_single_file_round_trip() {
        let routes = routes();
        let refs = routes.iter().collect::<Vec<_>>();
        let dir = tempfile::tempdir().unwrap();
        let written = write_route_files(
            dir.path(),
            "mapped_routes.rou.xml",
            RouteFileLayout::Single,
            &refs,
            &template(),
            true,
        )
        .unwrap();
        assert_eq!(written, vec![dir.path().join("mapped_routes.rou.xml")]);

        let text = std::fs::read_to_string(&written[0]).unwrap();
        assert!(text.contains("<vehicle id=\"91-1\" type=\"IC\" depart=\"0\">"));
        assert!(text.contains("<route edges=\"e1 e2\"/>"));

        let vehicles = read_route_file(&written[0]).unwrap();
        assert_eq!(
            vehicles,
            vec![
                VehicleRoute {
                    vehicle_id: String::from("91-1"),
                    edges: vec![String::from("e1"), String::from("e2")]
                },
                VehicleRoute {
                    vehicle_id: String::from("S/2"),
                    edges: vec![String::from("e3"), String::from("e2")]
                },
            ]
        );
    }

    #[test]
    fn test_per_trip_layout_and_listing() {
        let routes = routes();
        let refs = routes.iter().collect::<Vec<_>>();
        let dir = tempfile::tempdir().unwrap();
        let written = write_route_files(
            dir.path(),
            "mapped_routes.rou.xml",
            RouteFileLayout::PerTrip,
            &refs,
            &template(),
            true,
        )
        .unwrap();
        assert_eq!(written.len(), 2);
        std::fs::write(dir.path().join("notes.txt"), "not a route file").unwrap();
        let listed = list_route_files(dir.path()).unwrap();
        assert_eq!(
            listed,
            vec![
                dir.path().join("mapped_routes_91-1.rou.xml"),
                dir.path().join("mapped_routes_S_2.rou.xml"),
            ]
        );
    }

    #[test]
    fn test_overwrite_disabled_keeps_existing_file() {
        let routes = routes();
        let refs = routes.iter().collect::<Vec<_>>();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mapped_routes.rou.xml");
        std::fs::write(&path, "keep").unwrap();
        let written = write_route_file(&path, &refs, &template(), false).unwrap();
        assert!(!written);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "keep");
    }

    #[test]
    fn test_read_referenced_routes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ref.rou.xml");
        std::fs::write(
            &path,
            r#"<routes>
                <route id="r0" edges="a b"/>
                <vehicle id="v0" route="r0" depart="0"/>
                <vehicle id="v1" depart="5"/>
            </routes>"#,
        )
        .unwrap();
        let vehicles = read_route_file(&path).unwrap();
        assert_eq!(vehicles[0].edges, vec!["a", "b"]);
        assert!(vehicles[1].edges.is_empty());
    }

    #[test]
    fn test_per_trip_names_never_collide() {
        let stops = vec![Stop::new("c", 21.0, 1.0), Stop::new("d", 11.0, 1.0)];
        let routes = mapped(vec![Trip::new("S/2", stops.clone()), Trip::new("S_2", stops)]);
        let refs = routes.iter().collect::<Vec<_>>();
        let dir = tempfile::tempdir().unwrap();
        let written = write_route_files(
            dir.path(),
            "mapped_routes.rou.xml",
            RouteFileLayout::PerTrip,
            &refs,
            &template(),
            false,
        )
        .unwrap();
        assert_eq!(
            written,
            vec![
                dir.path().join("mapped_routes_S_2.rou.xml"),
                dir.path().join("mapped_routes_S_2_2.rou.xml"),
            ]
        );
        let vehicles = list_route_files(dir.path())
            .unwrap()
            .iter()
            .flat_map(|p| read_route_file(p).unwrap())
            .map(|v| v.vehicle_id)
            .collect::<Vec<_>>();
        assert_eq!(vehicles, vec!["S/2", "S_2"]);
    }

    #[test]
    fn test_vehicle_type_per_trip() {
        let routes = routes();
        let refs = routes.iter().collect::<Vec<_>>();
        let mut template = template();
        template
            .type_by_trip
            .insert(String::from("S/2"), String::from("ir_single_deck"));
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("typed.rou.xml");
        write_route_file(&path, &refs, &template, true).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("<vehicle id=\"91-1\" type=\"IC\" depart=\"0\">"));
        assert!(text.contains("<vehicle id=\"S/2\" type=\"ir_single_deck\" depart=\"0\">"));
    }
}
