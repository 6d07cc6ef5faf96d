use std::{collections::HashSet, path::Path};

use railmatch_sumo::plain::{write_plain_network, PlainNetworkFiles};

use super::RailMatchAppError;
use crate::input;

/// converts node and edge tables into plain network files for the network compiler.
/// edges referencing unknown nodes are dropped.
pub fn run(
    nodes_file: &Path,
    edges_file: &Path,
    id_column: &str,
    output_directory: &Path,
    name: &str,
    overwrite: bool,
) -> Result<PlainNetworkFiles, RailMatchAppError> {
    let nodes = input::read_plain_nodes(nodes_file)?;
    let node_ids = nodes.iter().map(|n| n.node_id.as_str()).collect::<HashSet<_>>();
    let (edges, orphans): (Vec<_>, Vec<_>) = input::read_plain_edges(edges_file, id_column)?
        .into_iter()
        .partition(|e| node_ids.contains(e.from.as_str()) && node_ids.contains(e.to.as_str()));
    for edge in orphans.iter() {
        log::warn!(
            "dropping edge '{}' with unknown node '{}' or '{}'",
            edge.id,
            edge.from,
            edge.to
        );
    }
    if edges.is_empty() {
        let msg = format!(
            "no edges of '{}' connect nodes of '{}'",
            edges_file.display(),
            nodes_file.display()
        );
        return Err(RailMatchAppError::InvalidUserInput(msg));
    }
    let files = PlainNetworkFiles::new(output_directory, name);
    write_plain_network(&files, &nodes, &edges, overwrite)?;
    log::info!(
        "plain network '{name}' written to '{}' ({} nodes, {} edges)",
        output_directory.display(),
        nodes.len(),
        edges.len()
    );
    Ok(files)
}
