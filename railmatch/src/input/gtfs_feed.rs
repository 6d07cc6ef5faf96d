use std::{collections::BTreeMap, path::Path, sync::Arc};

use gtfs_structures::{Gtfs, Stop};

use super::{StopRow, TripInput};
use crate::app::RailMatchAppError;

/// one trip per route of a GTFS feed, named after its route. the representative trip is
/// the route's trip with the lowest trip id. when `route_ids` is not empty, only those
/// routes are read.
pub fn read_gtfs_trips(
    feed: &Path,
    route_ids: &[String],
) -> Result<Vec<TripInput>, RailMatchAppError> {
    let feed_str = feed.to_str().ok_or_else(|| {
        RailMatchAppError::InvalidUserInput(format!(
            "GTFS feed path '{}' is not valid unicode",
            feed.display()
        ))
    })?;
    let gtfs = Gtfs::new(feed_str).map_err(|e| RailMatchAppError::GtfsError {
        path: feed.to_owned(),
        message: e.to_string(),
    })?;
    log::info!(
        "read GTFS feed '{}' with {} routes, {} trips and {} stops",
        feed.display(),
        gtfs.routes.len(),
        gtfs.trips.len(),
        gtfs.stops.len()
    );
    Ok(representative_trips(&gtfs, route_ids))
}

fn representative_trips(gtfs: &Gtfs, route_ids: &[String]) -> Vec<TripInput> {
    let mut by_route: BTreeMap<&str, &gtfs_structures::Trip> = BTreeMap::new();
    for trip in gtfs.trips.values() {
        if !route_ids.is_empty() && !route_ids.contains(&trip.route_id) {
            continue;
        }
        by_route
            .entry(trip.route_id.as_str())
            .and_modify(|current| {
                if trip.id < current.id {
                    *current = trip;
                }
            })
            .or_insert(trip);
    }
    for route_id in route_ids.iter() {
        if !by_route.contains_key(route_id.as_str()) {
            log::warn!("route '{route_id}' has no trips in the GTFS feed");
        }
    }

    by_route
        .into_iter()
        .map(|(route_id, trip)| {
            log::debug!("route '{route_id}' represented by trip '{}'", trip.id);
            let rows = trip
                .stop_times
                .iter()
                .map(|st| StopRow {
                    stop_id: st.stop.id.clone(),
                    sequence: Some(st.stop_sequence),
                    location: get_stop_location(&st.stop, gtfs),
                })
                .collect();
            TripInput::from_rows(route_id, rows)
        })
        .collect()
}

/// (longitude, latitude) of a stop, falling back to its parent station one level up.
fn get_stop_location(stop: &Arc<Stop>, gtfs: &Gtfs) -> Option<(f64, f64)> {
    if let (Some(lon), Some(lat)) = (stop.longitude, stop.latitude) {
        return Some((lon, lat));
    }
    stop.parent_station
        .as_ref()
        .and_then(|parent_id| gtfs.stops.get(parent_id))
        .and_then(|parent| match (parent.longitude, parent.latitude) {
            (Some(lon), Some(lat)) => Some((lon, lat)),
            _ => None,
        })
}
