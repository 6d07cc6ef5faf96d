use super::{EdgeMatcher, RejectionReason, RouteAssembler, TripReport};
use crate::{crs::CoordinateNormalizer, model::Trip, RailMatchError};

/// turns trips into route reports: normalize, match every stop, assemble.
///
/// holds only shared references and copies of its policies, so one mapper can serve
/// many threads at once.
pub struct RouteMapper<'a> {
    matcher: EdgeMatcher<'a>,
    assembler: RouteAssembler,
    normalizer: CoordinateNormalizer,
}

impl<'a> RouteMapper<'a> {
    /// # Errors
    ///
    /// fails when the normalizer does not produce coordinates in the topology's
    /// reference system.
    pub fn new(
        matcher: EdgeMatcher<'a>,
        assembler: RouteAssembler,
        normalizer: CoordinateNormalizer,
    ) -> Result<Self, RailMatchError> {
        let expected = matcher.topology().crs();
        if normalizer.target() != expected {
            return Err(RailMatchError::CrsMismatch {
                expected,
                found: normalizer.target(),
            });
        }
        Ok(Self {
            matcher,
            assembler,
            normalizer,
        })
    }

    /// coordinate failures reject the trip. any other error is a fault of the run itself.
    pub fn map_trip(&self, trip: &Trip) -> Result<TripReport, RailMatchError> {
        match self.matcher.match_trip(trip, &self.normalizer) {
            Ok(matches) => Ok(self
                .assembler
                .assemble(&trip.id, &matches, self.matcher.topology())),
            Err(e @ RailMatchError::InvalidCoordinate { .. })
            | Err(e @ RailMatchError::CrsMismatch { .. })
            | Err(e @ RailMatchError::UnsupportedTransform { .. }) => {
                log::warn!("trip '{}': {e}", trip.id);
                Ok(TripReport::rejected(
                    &trip.id,
                    trip.stops.len(),
                    RejectionReason::CoordinateSystem(e.to_string()),
                ))
            }
            Err(e) => Err(e),
        }
    }
}
