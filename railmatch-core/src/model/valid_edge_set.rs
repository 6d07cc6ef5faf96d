use std::collections::HashSet;

use crate::RailMatchError;

/// edge identifiers that survived compilation into the simulator network. any edge
/// outside this set is treated as non-existent, even when present in the topology.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidEdgeSet(HashSet<String>);

impl ValidEdgeSet {
    /// collects identifiers into a membership set.
    ///
    /// # Errors
    ///
    /// an empty set is a configuration error: nothing could ever be validated against it.
    pub fn new<I, S>(ids: I) -> Result<Self, RailMatchError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set: HashSet<String> = ids.into_iter().map(Into::into).collect();
        if set.is_empty() {
            return Err(RailMatchError::EmptyValidEdgeSet);
        }
        Ok(Self(set))
    }

    pub fn contains(&self, edge_id: &str) -> bool {
        self.0.contains(edge_id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
