use std::path::{Path, PathBuf};

use geo::LineString;
use itertools::Itertools;
use kdam::tqdm;
use serde::{Deserialize, Serialize};

use crate::{util::fs, xml::XmlWriter, SumoFileError};

/// a network node in plain XML form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlainNode {
    pub node_id: String,
    pub x: f64,
    pub y: f64,
}

/// a network edge in plain XML form. edges without shape are drawn straight
/// between their nodes by the network compiler.
#[derive(Debug, Clone, PartialEq)]
pub struct PlainEdge {
    pub id: String,
    pub from: String,
    pub to: String,
    pub shape: Option<LineString<f64>>,
}

/// the files making up one plain network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlainNetworkFiles {
    pub nodes: PathBuf,
    pub edges: PathBuf,
    pub connections: PathBuf,
}

impl PlainNetworkFiles {
    /// `<name>.nod.xml`, `<name>.edg.xml` and `<name>.con.xml` in `directory`.
    pub fn new(directory: &Path, name: &str) -> Self {
        Self {
            nodes: directory.join(format!("{name}.nod.xml")),
            edges: directory.join(format!("{name}.edg.xml")),
            connections: directory.join(format!("{name}.con.xml")),
        }
    }
}

/// makes an edge id safe for the simulator: `&` becomes `and`, separators and quotes
/// become `_`, repeated underscores collapse and leading/trailing underscores are trimmed.
pub fn sanitize_edge_id(edge_id: &str) -> String {
    let replaced = edge_id
        .replace('&', "and")
        .chars()
        .map(|c| match c {
            ' ' | ',' | ':' | '(' | ')' | '.' | '\\' | '/' | '"' | '\'' => '_',
            _ => c,
        })
        .collect::<String>();
    replaced
        .split('_')
        .filter(|part| !part.is_empty())
        .join("_")
}

/// formats a geometry as a `shape` attribute: `x,y` pairs with millimeter precision.
pub fn shape_attribute(shape: &LineString<f64>) -> String {
    shape
        .coords()
        .map(|c| format!("{:.3},{:.3}", c.x, c.y))
        .join(" ")
}

pub fn write_nodes(path: &Path, nodes: &[PlainNode], overwrite: bool) -> Result<(), SumoFileError> {
    let Some(file) = fs::create_writer(path, overwrite)? else {
        return Ok(());
    };
    let mut writer = XmlWriter::new(file, path)?;
    writer.start("nodes", &[])?;
    for node in tqdm!(nodes.iter(), total = nodes.len(), desc = "write nodes") {
        let x = node.x.to_string();
        let y = node.y.to_string();
        writer.empty(
            "node",
            &[("id", node.node_id.as_str()), ("x", x.as_str()), ("y", y.as_str())],
        )?;
    }
    eprintln!();
    writer.finish()?;
    log::info!("wrote {} nodes to '{}'", nodes.len(), path.display());
    Ok(())
}

pub fn write_edges(path: &Path, edges: &[PlainEdge], overwrite: bool) -> Result<(), SumoFileError> {
    let Some(file) = fs::create_writer(path, overwrite)? else {
        return Ok(());
    };
    let mut writer = XmlWriter::new(file, path)?;
    writer.start("edges", &[])?;
    for edge in tqdm!(edges.iter(), total = edges.len(), desc = "write edges") {
        let shape = edge.shape.as_ref().map(shape_attribute);
        let mut attributes = vec![
            ("id", edge.id.as_str()),
            ("from", edge.from.as_str()),
            ("to", edge.to.as_str()),
        ];
        if let Some(shape) = shape.as_deref() {
            attributes.push(("shape", shape));
        }
        writer.empty("edge", &attributes)?;
    }
    eprintln!();
    writer.finish()?;
    log::info!("wrote {} edges to '{}'", edges.len(), path.display());
    Ok(())
}

/// an empty connection file, letting the network compiler guess all connections.
pub fn write_empty_connections(path: &Path, overwrite: bool) -> Result<(), SumoFileError> {
    let Some(file) = fs::create_writer(path, overwrite)? else {
        return Ok(());
    };
    let mut writer = XmlWriter::new(file, path)?;
    writer.empty("connections", &[])?;
    writer.finish()?;
    Ok(())
}

/// writes nodes, edges and an empty connection file.
pub fn write_plain_network(
    files: &PlainNetworkFiles,
    nodes: &[PlainNode],
    edges: &[PlainEdge],
    overwrite: bool,
) -> Result<(), SumoFileError> {
    write_nodes(&files.nodes, nodes, overwrite)?;
    write_edges(&files.edges, edges, overwrite)?;
    write_empty_connections(&files.connections, overwrite)?;
    Ok(())
}
