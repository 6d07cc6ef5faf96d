use std::path::{Path, PathBuf};

use railmatch_core::model::ValidEdgeSet;

use crate::{routes, SumoFileError};

/// a route edge that does not exist in the compiled network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidEdgeReference {
    pub file: PathBuf,
    pub vehicle_id: String,
    pub edge_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteValidationReport {
    pub files_checked: usize,
    pub vehicles_checked: usize,
    pub invalid: Vec<InvalidEdgeReference>,
}

impl RouteValidationReport {
    pub fn is_valid(&self) -> bool {
        self.invalid.is_empty()
    }
}

/// checks the route edges of every vehicle in every `*.rou.xml` file of `directory`
/// against the compiled network.
pub fn validate_route_directory(
    directory: &Path,
    valid_edges: &ValidEdgeSet,
) -> Result<RouteValidationReport, SumoFileError> {
    let files = routes::list_route_files(directory)?;
    log::info!(
        "validating {} route files in '{}'",
        files.len(),
        directory.display()
    );
    let mut report = RouteValidationReport::default();
    for file in files.iter() {
        let vehicles = routes::read_route_file(file)?;
        report.files_checked += 1;
        report.vehicles_checked += vehicles.len();
        let invalid = vehicles
            .iter()
            .flat_map(|v| {
                v.edges
                    .iter()
                    .filter(move |e| !valid_edges.contains(e))
                    .map(move |e| InvalidEdgeReference {
                        file: file.clone(),
                        vehicle_id: v.vehicle_id.clone(),
                        edge_id: e.clone(),
                    })
            })
            .collect::<Vec<_>>();
        if invalid.is_empty() {
            log::info!("{} is valid", file.display());
        } else {
            log::warn!(
                "found {} invalid edge(s) in {}",
                invalid.len(),
                file.display()
            );
            for entry in invalid.iter() {
                log::warn!(
                    "  vehicle '{}' references unknown edge '{}'",
                    entry.vehicle_id,
                    entry.edge_id
                );
            }
        }
        report.invalid.extend(invalid);
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reports_unknown_edges_per_vehicle() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("a.rou.xml"),
            r#"<routes><vehicle id="v1" depart="0"><route edges="e1 e2"/></vehicle></routes>"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join("b.rou.xml"),
            r#"<routes>
                <vehicle id="v2" depart="0"><route edges="e1 ghost"/></vehicle>
                <vehicle id="v3" depart="0"><route edges="e2"/></vehicle>
            </routes>"#,
        )
        .unwrap();
        let valid = ValidEdgeSet::new(["e1", "e2"]).unwrap();
        let report = validate_route_directory(dir.path(), &valid).unwrap();
        assert_eq!(report.files_checked, 2);
        assert_eq!(report.vehicles_checked, 3);
        assert!(!report.is_valid());
        assert_eq!(
            report.invalid,
            vec![InvalidEdgeReference {
                file: dir.path().join("b.rou.xml"),
                vehicle_id: String::from("v2"),
                edge_id: String::from("ghost"),
            }]
        );
    }

    #[test]
    fn test_malformed_route_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.rou.xml"), "<routes><vehicle>").unwrap();
        let valid = ValidEdgeSet::new(["e1"]).unwrap();
        let result = validate_route_directory(dir.path(), &valid);
        assert!(matches!(result, Err(SumoFileError::XmlError { .. })));
    }
}
