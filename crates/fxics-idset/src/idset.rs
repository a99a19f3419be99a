//! [`IdSet`]: canonical, replica-grouped set of 48-bit global counters
//! (§3, §4.2).

use fxics_dtyp::Guid;

use crate::error::{IdSetError, Result};
use crate::range::{includes, merge_ranges, Range};

/// An ordered mapping replica-GUID → ordered list of non-overlapping,
/// non-adjacent inclusive ranges.
///
/// `single` marks a set (typically a parsed `PidTagCnsetSeen` upload)
/// where only the final range per replica is semantically meaningful on
/// subsequent merges (§3 invariant iii, §4.2 "Property `single`").
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IdSet {
    replicas: Vec<(Guid, Vec<Range>)>,
    single: bool,
}

impl IdSet {
    pub fn empty() -> Self {
        IdSet::default()
    }

    /// Builds an `IdSet` directly from already-canonical, sorted,
    /// non-empty-per-replica parts. Used by [`crate::RawIdSet::to_idset`]
    /// and [`IdSet::parse`].
    pub(crate) fn from_canonical_parts(replicas: Vec<(Guid, Vec<Range>)>, single: bool) -> Self {
        IdSet { replicas, single }
    }

    pub fn is_single(&self) -> bool {
        self.single
    }

    /// Marks this set `single`, matching `SyncUploadStateStreamEnd`'s
    /// installation of a parsed `PidTagCnsetSeen` upload (§4.2, §4.6).
    pub fn mark_single(&mut self) {
        self.single = true;
    }

    pub fn is_empty(&self) -> bool {
        self.replicas.is_empty()
    }

    pub fn includes(&self, guid: &Guid, id: u64) -> bool {
        self.replicas
            .iter()
            .find(|(g, _)| g == guid)
            .is_some_and(|(_, ranges)| includes(ranges, id))
    }

    pub fn replicas(&self) -> impl Iterator<Item = (&Guid, &[Range])> {
        self.replicas.iter().map(|(g, r)| (g, r.as_slice()))
    }

    /// Replica-wise merge, fusing touching ranges (§4.2). Associative and
    /// commutative; `merge(x, empty) == x`. When either operand is
    /// `single`, every replica in the result is collapsed to just its
    /// highest range, matching "retain only the final range per replica
    /// on subsequent merges".
    pub fn merge(a: &IdSet, b: &IdSet) -> IdSet {
        let single = a.single || b.single;

        let mut replicas: Vec<(Guid, Vec<Range>)> = Vec::new();
        for (guid, ranges) in a.replicas.iter().chain(b.replicas.iter()) {
            match replicas.iter_mut().find(|(g, _)| g == guid) {
                Some((_, acc)) => *acc = merge_ranges(acc, ranges),
                None => replicas.push((*guid, ranges.clone())),
            }
        }
        replicas.sort_by_key(|(g, _)| *g);

        if single {
            for (_, ranges) in replicas.iter_mut() {
                if let Some(last) = ranges.last().copied() {
                    *ranges = vec![last];
                }
            }
        }

        IdSet { replicas, single }
    }

    /// Decodes the compact wire form (§6). A zero-length input is the
    /// canonical empty set, not an error (confirmed by the original
    /// `IDSET_parse` behavior, see SPEC_FULL.md §10).
    pub fn parse(bytes: &[u8]) -> Result<IdSet> {
        let mut cur = Cursor::new(bytes);
        if bytes.is_empty() {
            return Ok(IdSet::empty());
        }

        let replica_count = cur.read_u32()?;
        let mut replicas = Vec::with_capacity(replica_count as usize);
        for _ in 0..replica_count {
            let guid = cur.read_guid()?;
            let range_count = cur.read_u32()?;
            let mut ranges = Vec::with_capacity(range_count as usize);
            let mut prev_hi: Option<u64> = None;
            for _ in 0..range_count {
                let lo = cur.read_u64()?;
                let hi = cur.read_u64()?;
                if lo > hi {
                    return Err(IdSetError::NonMonotone);
                }
                if let Some(prev_hi) = prev_hi {
                    if lo <= prev_hi.saturating_add(1) {
                        return Err(IdSetError::NonMonotone);
                    }
                }
                prev_hi = Some(hi);
                ranges.push(Range { lo, hi });
            }
            replicas.push((guid, ranges));
        }

        Ok(IdSet {
            replicas,
            single: false,
        })
    }

    /// Encodes the compact wire form; canonical (no empty replica entries,
    /// ranges sorted and fused). `serialize(parse(x)) == x` for canonical
    /// `x` (§8 I3).
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::new();
        let non_empty: Vec<_> = self.replicas.iter().filter(|(_, r)| !r.is_empty()).collect();
        out.extend_from_slice(&(non_empty.len() as u32).to_le_bytes());
        for (guid, ranges) in non_empty {
            out.extend_from_slice(guid.as_bytes());
            out.extend_from_slice(&(ranges.len() as u32).to_le_bytes());
            for r in ranges {
                out.extend_from_slice(&r.lo.to_le_bytes());
                out.extend_from_slice(&r.hi.to_le_bytes());
            }
        }
        out
    }
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Cursor { bytes, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.pos + n > self.bytes.len() {
            return Err(IdSetError::Truncated {
                needed: n,
                available: self.bytes.len() - self.pos,
            });
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn read_u32(&mut self) -> Result<u32> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes(b.try_into().unwrap()))
    }

    fn read_u64(&mut self) -> Result<u64> {
        let b = self.take(8)?;
        Ok(u64::from_le_bytes(b.try_into().unwrap()))
    }

    fn read_guid(&mut self) -> Result<Guid> {
        let b = self.take(16)?;
        let mut arr = [0u8; 16];
        arr.copy_from_slice(b);
        Ok(Guid::from_bytes(arr))
    }
}
