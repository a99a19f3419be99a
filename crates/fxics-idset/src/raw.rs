//! [`RawIdSet`]: an unnormalized accumulator of `(replica_guid, id)` points
//! in insertion order, converted to a canonical [`IdSet`] by sort-and-merge.

use std::collections::BTreeMap;

use fxics_dtyp::Guid;

use crate::idset::IdSet;
use crate::range::{normalize, Range};

#[derive(Debug, Clone, Default)]
pub struct RawIdSet {
    points: Vec<(Guid, u64)>,
}

impl RawIdSet {
    pub fn new() -> Self {
        RawIdSet::default()
    }

    /// O(1) append (§4.2).
    pub fn push(&mut self, replica_guid: Guid, id: u64) {
        self.points.push((replica_guid, id));
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// O(n log n): groups by replica, sorts, and fuses into inclusive
    /// ranges.
    pub fn to_idset(&self) -> IdSet {
        let mut by_replica: BTreeMap<Guid, Vec<Range>> = BTreeMap::new();
        for (guid, id) in &self.points {
            by_replica.entry(*guid).or_default().push(Range::single(*id));
        }

        let mut replicas: Vec<(Guid, Vec<Range>)> = by_replica
            .into_iter()
            .map(|(guid, ranges)| (guid, normalize(ranges)))
            .collect();
        replicas.sort_by_key(|(guid, _)| *guid);

        IdSet::from_canonical_parts(replicas, false)
    }
}
