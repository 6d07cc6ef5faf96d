use std::path::Path;

use kdam::tqdm;
use railmatch_core::model::{Edge, EdgeRecord};
use railmatch_sumo::plain::{sanitize_edge_id, PlainEdge, PlainNode};

use crate::{app::RailMatchAppError, util::fs};

/// reads a node table with `node_id`, `x` and `y` columns.
pub fn read_plain_nodes(nodes_file: &Path) -> Result<Vec<PlainNode>, RailMatchAppError> {
    let mut reader = fs::csv_reader(nodes_file)?;
    let nodes = reader
        .deserialize::<PlainNode>()
        .enumerate()
        .map(|(idx, row)| {
            row.map_err(|e| RailMatchAppError::ReadError {
                path: nodes_file.to_owned(),
                message: format!("row {}: {e}", idx + 1),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    log::info!("read {} nodes from '{}'", nodes.len(), nodes_file.display());
    Ok(nodes)
}

/// reads an edge table with an id column, `from_node`, `to_node` and an optional WKT
/// `geometry` column. ids are sanitized for the simulator. edges without both node
/// references are dropped, edges with unusable geometry keep a straight shape.
pub fn read_plain_edges(
    edges_file: &Path,
    id_column: &str,
) -> Result<Vec<PlainEdge>, RailMatchAppError> {
    let mut reader = fs::csv_reader(edges_file)?;
    let headers = fs::headers(&mut reader, edges_file)?;
    let id_col = fs::column_index(&headers, id_column, edges_file)?;
    let from_col = fs::column_index(&headers, "from_node", edges_file)?;
    let to_col = fs::column_index(&headers, "to_node", edges_file)?;
    let geometry_col = headers.iter().position(|h| h == "geometry");

    let mut edges = vec![];
    let mut dropped = 0;
    for (idx, row) in tqdm!(reader.records().enumerate(), desc = "read edges") {
        let row = row.map_err(|e| RailMatchAppError::ReadError {
            path: edges_file.to_owned(),
            message: format!("row {}: {e}", idx + 1),
        })?;
        let cell = |col: usize| row.get(col).filter(|v| !v.is_empty()).map(String::from);
        let (Some(raw_id), Some(from), Some(to)) = (cell(id_col), cell(from_col), cell(to_col))
        else {
            log::warn!("dropping edge row {} without id or node references", idx + 1);
            dropped += 1;
            continue;
        };
        let record = EdgeRecord {
            id: sanitize_edge_id(&raw_id),
            geometry: geometry_col.and_then(cell),
            from_node: Some(from),
            to_node: Some(to),
        };
        let shape = match record.geometry {
            None => None,
            Some(_) => match Edge::try_from_record(&record) {
                Ok(edge) => Some(edge.geometry),
                Err(e) => {
                    log::warn!("{e}, writing a straight edge");
                    None
                }
            },
        };
        edges.push(PlainEdge {
            id: record.id,
            from: record.from_node.unwrap_or_default(),
            to: record.to_node.unwrap_or_default(),
            shape,
        });
    }
    eprintln!();
    log::info!(
        "read {} edges from '{}', {dropped} dropped",
        edges.len(),
        edges_file.display()
    );
    Ok(edges)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_nodes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nodes.csv");
        std::fs::write(&path, "node_id,x,y\nn1,2600000.0,1200000.0\nn2,2600100,1200000\n").unwrap();
        let nodes = read_plain_nodes(&path).unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[1].x, 2600100.0);
    }

    #[test]
    fn test_read_edges() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("edges.csv");
        std::fs::write(
            &path,
            "edge_id_human,from_node,to_node,geometry\n\
             Bern - Thun,n1,n2,\"LINESTRING (0 0, 5 1, 10 0)\"\n\
             Thun - Spiez,n2,n3,\"not wkt\"\n\
             orphan,,n3,\n",
        )
        .unwrap();
        let edges = read_plain_edges(&path, "edge_id_human").unwrap();
        assert_eq!(edges.len(), 2);
        assert_eq!(edges[0].id, "Bern_-_Thun");
        assert_eq!(edges[0].shape.as_ref().map(|s| s.0.len()), Some(3));
        assert_eq!(edges[1].id, "Thun_-_Spiez");
        assert_eq!(edges[1].shape, None);
    }
}
