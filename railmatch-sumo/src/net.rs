use std::path::Path;

use railmatch_core::model::ValidEdgeSet;

use crate::{util::fs, xml, SumoFileError};

/// reads the edge ids of a compiled network.
///
/// files named `*.xml` or `*.xml.gz` are parsed as SUMO networks: every `edge` element
/// with an `id` counts, except internal junction edges (`function="internal"`) unless
/// `include_internal` is set. any other file is read as a plain list with one id per
/// line, where blank lines and lines starting with `#` are ignored.
pub fn read_network_edge_ids(
    path: &Path,
    include_internal: bool,
) -> Result<Vec<String>, SumoFileError> {
    let text = fs::read_to_string(path)?;
    if is_xml(path) {
        edge_ids_from_net_xml(&text, path, include_internal)
    } else {
        Ok(edge_ids_from_list(&text))
    }
}

/// loads the valid edge set from a compiled network. an empty network is fatal.
pub fn load_valid_edge_set(
    path: &Path,
    include_internal: bool,
) -> Result<ValidEdgeSet, SumoFileError> {
    let ids = read_network_edge_ids(path, include_internal)?;
    let valid = ValidEdgeSet::new(ids).map_err(|e| {
        log::error!("no edge ids found in '{}'", path.display());
        SumoFileError::from(e)
    })?;
    log::info!(
        "loaded {} valid edge ids from '{}'",
        valid.len(),
        path.display()
    );
    Ok(valid)
}

fn is_xml(path: &Path) -> bool {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    name.ends_with(".xml") || name.ends_with(".xml.gz")
}

fn edge_ids_from_net_xml(
    text: &str,
    path: &Path,
    include_internal: bool,
) -> Result<Vec<String>, SumoFileError> {
    let doc = xml::parse_document(text, path)?;
    let ids = doc
        .descendants()
        .filter(|n| n.has_tag_name("edge"))
        .filter(|n| include_internal || n.attribute("function") != Some("internal"))
        .filter_map(|n| n.attribute("id"))
        .map(String::from)
        .collect();
    Ok(ids)
}

fn edge_ids_from_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use railmatch_core::RailMatchError;

    const NET: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<net version="1.20">
    <location netOffset="0.00,0.00" projParameter="!"/>
    <edge id=":n2_0" function="internal">
        <lane id=":n2_0_0" index="0" speed="13.89" length="0.10" shape="10.00,0.00 10.00,0.00"/>
    </edge>
    <edge id="e1" from="n1" to="n2" priority="-1">
        <lane id="e1_0" index="0" speed="13.89" length="10.00" shape="0.00,0.00 10.00,0.00"/>
    </edge>
    <edge id="e2" from="n2" to="n3" priority="-1">
        <lane id="e2_0" index="0" speed="13.89" length="10.00" shape="10.00,0.00 20.00,0.00"/>
    </edge>
    <junction id="n2" type="priority" x="10.00" y="0.00"/>
</net>
"#;

    #[test]
    fn test_net_xml_skips_internal_edges() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rail.net.xml");
        std::fs::write(&path, NET).unwrap();
        let ids = read_network_edge_ids(&path, false).unwrap();
        assert_eq!(ids, vec!["e1", "e2"]);
        let with_internal = read_network_edge_ids(&path, true).unwrap();
        assert_eq!(with_internal, vec![":n2_0", "e1", "e2"]);
    }

    #[test]
    fn test_plain_list() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("edges.txt");
        std::fs::write(&path, "# compiled edges\ne1\n\n  e2 \n").unwrap();
        let valid = load_valid_edge_set(&path, false).unwrap();
        assert_eq!(valid.len(), 2);
        assert!(valid.contains("e2"));
    }

    #[test]
    fn test_empty_network_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.net.xml");
        std::fs::write(&path, "<net/>").unwrap();
        let result = load_valid_edge_set(&path, false);
        assert!(matches!(
            result,
            Err(SumoFileError::MatchError(RailMatchError::EmptyValidEdgeSet))
        ));
    }

    #[test]
    fn test_missing_file_names_the_path() {
        let result = read_network_edge_ids(Path::new("does/not/exist.net.xml"), false);
        match result {
            Err(SumoFileError::ReadError { path, .. }) => {
                assert_eq!(path, Path::new("does/not/exist.net.xml"))
            }
            other => panic!("expected read error, found {other:?}"),
        }
    }
}
