use std::path::Path;

use kdam::tqdm;
use railmatch_core::model::{EdgeRecord, Topology, TopologyLoadReport};
use railmatch_sumo::plain::sanitize_edge_id;

use crate::{
    app::{RailMatchAppError, TopologyConfig},
    util::fs,
};

/// reads the raw topology rows. the id and geometry columns are required, the node
/// columns are read when present.
pub fn read_edge_records(config: &TopologyConfig) -> Result<Vec<EdgeRecord>, RailMatchAppError> {
    let path = config.edges_file.as_path();
    let mut reader = fs::csv_reader(path)?;
    let headers = fs::headers(&mut reader, path)?;
    let id_col = fs::column_index(&headers, &config.id_column, path)?;
    let geometry_col = fs::column_index(&headers, &config.geometry_column, path)?;
    let from_col = headers.iter().position(|h| h == &config.from_column);
    let to_col = headers.iter().position(|h| h == &config.to_column);
    if from_col.is_none() || to_col.is_none() {
        log::info!(
            "'{}' has no '{}'/'{}' columns, edges will carry no node references",
            path.display(),
            config.from_column,
            config.to_column
        );
    }

    let mut records = vec![];
    for (idx, row) in tqdm!(reader.records().enumerate(), desc = "read topology") {
        let row = row.map_err(|e| RailMatchAppError::ReadError {
            path: path.to_owned(),
            message: format!("row {}: {e}", idx + 1),
        })?;
        let Some(raw_id) = row.get(id_col).filter(|id| !id.is_empty()) else {
            log::warn!("skipping topology row {} without edge id", idx + 1);
            continue;
        };
        let id = if config.sanitize_ids {
            sanitize_edge_id(raw_id)
        } else {
            raw_id.to_string()
        };
        let cell = |col: Option<usize>| {
            col.and_then(|c| row.get(c))
                .filter(|v| !v.is_empty())
                .map(String::from)
        };
        records.push(EdgeRecord {
            id,
            geometry: cell(Some(geometry_col)),
            from_node: cell(from_col),
            to_node: cell(to_col),
        });
    }
    eprintln!();
    Ok(records)
}

/// reads and indexes the rail topology. an empty topology is an error.
pub fn load_topology(
    config: &TopologyConfig,
) -> Result<(Topology, TopologyLoadReport), RailMatchAppError> {
    let records = read_edge_records(config)?;
    let (topology, report) = Topology::from_records(config.crs, records)?;
    log::info!(
        "loaded {} of {} topology edges from '{}' ({} dropped: {} missing geometry, {} invalid geometry, {} duplicate id)",
        report.edges_loaded,
        report.records_read,
        config.edges_file.display(),
        report.records_dropped(),
        report.dropped_missing_geometry,
        report.dropped_invalid_geometry,
        report.dropped_duplicate_id
    );
    Ok((topology, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use railmatch_core::{crs::Crs, RailMatchError};
    use std::path::PathBuf;

    fn config(edges_file: &Path) -> TopologyConfig {
        TopologyConfig {
            edges_file: edges_file.to_owned(),
            id_column: String::from("edge_id"),
            geometry_column: String::from("geometry"),
            from_column: String::from("from_node"),
            to_column: String::from("to_node"),
            crs: Crs::Lv95,
            sanitize_ids: false,
        }
    }

    fn write_edges(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rail_edges.csv");
        std::fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    fn test_load_drops_rows_without_geometry() {
        let (_dir, path) = write_edges(
            "edge_id,from_node,to_node,geometry\n\
             e1,n1,n2,\"LINESTRING (0 0, 100 0)\"\n\
             e2,n2,n3,\n\
             e3,n3,n4,\"POINT (1 1)\"\n\
             e1,n1,n2,\"LINESTRING (0 5, 100 5)\"\n",
        );
        let (topology, report) = load_topology(&config(&path)).unwrap();
        assert_eq!(topology.len(), 1);
        assert_eq!(report.records_read, 4);
        assert_eq!(report.dropped_missing_geometry, 1);
        assert_eq!(report.dropped_invalid_geometry, 1);
        assert_eq!(report.dropped_duplicate_id, 1);
        assert_eq!(topology.get("e1").and_then(|e| e.to_node.as_deref()), Some("n2"));
    }

    #[test]
    fn test_node_columns_are_optional() {
        let (_dir, path) = write_edges("edge_id,geometry\ne1,\"LINESTRING (0 0, 100 0)\"\n");
        let records = read_edge_records(&config(&path)).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].from_node, None);
    }

    #[test]
    fn test_sanitized_ids() {
        let (_dir, path) = write_edges("edge_id,geometry\n\"Bern (West)\",\"LINESTRING (0 0, 1 0)\"\n");
        let mut conf = config(&path);
        conf.sanitize_ids = true;
        let records = read_edge_records(&conf).unwrap();
        assert_eq!(records[0].id, "Bern_West");
    }

    #[test]
    fn test_empty_topology_is_fatal() {
        let (_dir, path) = write_edges("edge_id,geometry\ne1,\n");
        match load_topology(&config(&path)) {
            Err(RailMatchAppError::MatchError(RailMatchError::EmptyTopology)) => {}
            other => panic!("expected empty topology error, found {:?}", other.err()),
        }
    }

    #[test]
    fn test_missing_geometry_column() {
        let (_dir, path) = write_edges("edge_id,wkt\ne1,\"LINESTRING (0 0, 1 0)\"\n");
        assert!(matches!(
            read_edge_records(&config(&path)),
            Err(RailMatchAppError::ReadError { .. })
        ));
    }
}
