mod gtfs_feed;
mod plain_network;
mod stop_sequences;
mod topology;

pub use gtfs_feed::read_gtfs_trips;
pub use plain_network::{read_plain_edges, read_plain_nodes};
pub use stop_sequences::{read_stop_locations, read_stop_sequence_trips};
pub use topology::{load_topology, read_edge_records};

use railmatch_core::model::{Stop, Trip};

/// a trip as read from its source, before any stop is matched. stops without
/// coordinates are set aside so the missing stop policy can decide about them.
#[derive(Debug, Clone, PartialEq)]
pub struct TripInput {
    pub trip: Trip,
    pub missing_stops: Vec<String>,
}

/// one stop row of a trip source: identifier, optional ordering field and the
/// (longitude, latitude) pair if the stop could be located.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct StopRow {
    pub stop_id: String,
    pub sequence: Option<u32>,
    pub location: Option<(f64, f64)>,
}

impl TripInput {
    /// orders stops by their sequence field when every row carries one, otherwise keeps
    /// the order rows were read in.
    pub(crate) fn from_rows(trip_id: &str, rows: Vec<StopRow>) -> Self {
        let with_sequence = rows.iter().filter(|r| r.sequence.is_some()).count();
        let sequenced = with_sequence == rows.len();
        if with_sequence > 0 && !sequenced {
            log::warn!(
                "trip '{trip_id}': {} of {} stops lack a stop_sequence, keeping file order",
                rows.len() - with_sequence,
                rows.len()
            );
        }
        let mut missing_stops = vec![];
        let mut stops = vec![];
        for (idx, row) in rows.into_iter().enumerate() {
            match row.location {
                Some((lon, lat)) => {
                    let order = if sequenced {
                        row.sequence.unwrap_or_default()
                    } else {
                        idx as u32
                    };
                    stops.push((order, Stop::new(row.stop_id, lon, lat)));
                }
                None => missing_stops.push(row.stop_id),
            }
        }
        Self {
            trip: Trip::from_sequenced(trip_id, stops),
            missing_stops,
        }
    }
}
