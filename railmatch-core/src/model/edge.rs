use geo::{Coord, Distance, Euclidean, LineString, MultiLineString, Point};
use serde::{Deserialize, Serialize};
use wkt::TryFromWkt;

use crate::RailMatchError;

/// a raw topology row before geometry parsing. geometry is well-known-text in the
/// topology's projected reference system and may be missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub id: String,
    pub geometry: Option<String>,
    pub from_node: Option<String>,
    pub to_node: Option<String>,
}

/// a rail edge with its polyline geometry. endpoints are the first and last coordinate.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub id: String,
    pub geometry: LineString<f64>,
    pub from_node: Option<String>,
    pub to_node: Option<String>,
}

impl Edge {
    pub fn new(
        id: String,
        geometry: LineString<f64>,
        from_node: Option<String>,
        to_node: Option<String>,
    ) -> Result<Self, RailMatchError> {
        if geometry.0.is_empty() {
            return Err(RailMatchError::InvalidGeometry {
                edge_id: id,
                message: String::from("linestring has no coordinates"),
            });
        }
        if geometry.lines().all(|l| l.start == l.end) {
            return Err(RailMatchError::InvalidGeometry {
                edge_id: id,
                message: String::from("linestring needs at least two distinct coordinates"),
            });
        }
        if geometry.coords().any(|c| !c.x.is_finite() || !c.y.is_finite()) {
            return Err(RailMatchError::InvalidGeometry {
                edge_id: id,
                message: String::from("linestring contains non-finite coordinates"),
            });
        }
        Ok(Self {
            id,
            geometry,
            from_node,
            to_node,
        })
    }

    /// parses a topology row. records without geometry or with geometry that is not
    /// a (contiguous) line fail with [`RailMatchError::InvalidGeometry`].
    pub fn try_from_record(record: &EdgeRecord) -> Result<Self, RailMatchError> {
        let wkt_str = record
            .geometry
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| RailMatchError::InvalidGeometry {
                edge_id: record.id.clone(),
                message: String::from("missing geometry"),
            })?;
        let geometry = parse_line_wkt(wkt_str).map_err(|message| RailMatchError::InvalidGeometry {
            edge_id: record.id.clone(),
            message,
        })?;
        Edge::new(
            record.id.clone(),
            geometry,
            non_empty(record.from_node.as_deref()),
            non_empty(record.to_node.as_deref()),
        )
    }

    pub fn start(&self) -> Coord<f64> {
        self.geometry.0[0]
    }

    pub fn end(&self) -> Coord<f64> {
        self.geometry.0[self.geometry.0.len() - 1]
    }

    /// true if this edge touches `other`. node references decide when both edges carry
    /// them, otherwise endpoints within `endpoint_tolerance` count as touching.
    pub fn touches(&self, other: &Edge, endpoint_tolerance: f64) -> bool {
        let nodes = (
            self.from_node.as_ref(),
            self.to_node.as_ref(),
            other.from_node.as_ref(),
            other.to_node.as_ref(),
        );
        if let (Some(a_from), Some(a_to), Some(b_from), Some(b_to)) = nodes {
            return a_from == b_from || a_from == b_to || a_to == b_from || a_to == b_to;
        }
        let ends = [self.start(), self.end()];
        let other_ends = [other.start(), other.end()];
        ends.iter().any(|a| {
            other_ends
                .iter()
                .any(|b| Euclidean.distance(Point(*a), Point(*b)) <= endpoint_tolerance)
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// accepts LINESTRING, or MULTILINESTRING whose parts chain end-to-start.
fn parse_line_wkt(wkt_str: &str) -> Result<LineString<f64>, String> {
    let geometry = geo::Geometry::<f64>::try_from_wkt_str(wkt_str)
        .map_err(|e| format!("unparseable WKT: {e}"))?;
    match geometry {
        geo::Geometry::LineString(ls) => Ok(ls),
        geo::Geometry::MultiLineString(mls) => join_parts(mls),
        other => Err(format!(
            "expected LINESTRING or MULTILINESTRING, found {}",
            geometry_name(&other)
        )),
    }
}

fn join_parts(mls: MultiLineString<f64>) -> Result<LineString<f64>, String> {
    let mut coords: Vec<Coord<f64>> = vec![];
    for part in mls.0.into_iter().filter(|p| !p.0.is_empty()) {
        let skip = match (coords.last(), part.0.first()) {
            (Some(prev), Some(next)) if prev != next => {
                return Err(String::from("MULTILINESTRING parts are not contiguous"));
            }
            (Some(_), _) => 1,
            (None, _) => 0,
        };
        coords.extend(part.0.into_iter().skip(skip));
    }
    Ok(LineString::new(coords))
}

fn geometry_name(g: &geo::Geometry<f64>) -> &'static str {
    match g {
        geo::Geometry::Point(_) => "POINT",
        geo::Geometry::Line(_) => "LINE",
        geo::Geometry::LineString(_) => "LINESTRING",
        geo::Geometry::Polygon(_) => "POLYGON",
        geo::Geometry::MultiPoint(_) => "MULTIPOINT",
        geo::Geometry::MultiLineString(_) => "MULTILINESTRING",
        geo::Geometry::MultiPolygon(_) => "MULTIPOLYGON",
        geo::Geometry::GeometryCollection(_) => "GEOMETRYCOLLECTION",
        geo::Geometry::Rect(_) => "RECT",
        geo::Geometry::Triangle(_) => "TRIANGLE",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, wkt: Option<&str>) -> EdgeRecord {
        EdgeRecord {
            id: id.to_string(),
            geometry: wkt.map(String::from),
            from_node: None,
            to_node: None,
        }
    }

    #[test]
    fn test_parse_linestring_record() {
        let edge = Edge::try_from_record(&record("e1", Some("LINESTRING (0 0, 10 0)"))).unwrap();
        assert_eq!(edge.start(), Coord { x: 0.0, y: 0.0 });
        assert_eq!(edge.end(), Coord { x: 10.0, y: 0.0 });
    }

    #[test]
    fn test_contiguous_multilinestring_is_joined() {
        let edge = Edge::try_from_record(&record(
            "e1",
            Some("MULTILINESTRING ((0 0, 5 0), (5 0, 10 0))"),
        ))
        .unwrap();
        assert_eq!(edge.geometry.0.len(), 3);
    }

    #[test]
    fn test_disjoint_multilinestring_fails() {
        let result = Edge::try_from_record(&record(
            "e1",
            Some("MULTILINESTRING ((0 0, 5 0), (6 0, 10 0))"),
        ));
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_and_bad_geometry_fail() {
        assert!(Edge::try_from_record(&record("e1", None)).is_err());
        assert!(Edge::try_from_record(&record("e1", Some("  "))).is_err());
        assert!(Edge::try_from_record(&record("e1", Some("LINESTRING (0 0,"))).is_err());
        assert!(Edge::try_from_record(&record("e1", Some("POINT (0 0)"))).is_err());
        assert!(Edge::try_from_record(&record("e1", Some("LINESTRING (1 1, 1 1)"))).is_err());
    }

    #[test]
    fn test_touches_by_nodes_and_by_endpoints() {
        let mut a = Edge::try_from_record(&record("a", Some("LINESTRING (0 0, 10 0)"))).unwrap();
        let mut b = Edge::try_from_record(&record("b", Some("LINESTRING (10.5 0, 20 0)"))).unwrap();
        assert!(!a.touches(&b, 0.1));
        assert!(a.touches(&b, 1.0));

        a.from_node = Some("n1".into());
        a.to_node = Some("n2".into());
        b.from_node = Some("n3".into());
        b.to_node = Some("n4".into());
        // node references win over geometric proximity
        assert!(!a.touches(&b, 1.0));
        b.from_node = Some("n2".into());
        assert!(a.touches(&b, 0.0));
    }
}
