//! Wire `SYSTIME` (Windows `FILETIME`) encoding, and the Unix-seconds time
//! the rest of the crate reasons about internally.

use binrw::binrw;

/// 100ns ticks between the FILETIME epoch (1601-01-01) and the Unix epoch
/// (1970-01-01).
const FILETIME_UNIX_DIFF_100NS: u64 = 116_444_736_000_000_000;

/// A point in time expressed as whole seconds since the Unix epoch. Internal
/// currency for `last_modification_time` and the `EPOCH` constant of §4.1;
/// converted to/from the wire [`FileTime`] only at the property-serializer
/// boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UnixTime(pub u32);

impl UnixTime {
    pub fn saturating_sub(self, other: UnixTime) -> u32 {
        self.0.saturating_sub(other.0)
    }

    pub fn max(self, other: UnixTime) -> UnixTime {
        UnixTime(self.0.max(other.0))
    }
}

/// Wire form of a `SYSTIME`-typed property value: a Windows `FILETIME`,
/// low/high 32-bit halves, little-endian.
#[binrw]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FileTime {
    pub low: u32,
    pub high: u32,
}

impl FileTime {
    pub fn from_unix_time(t: UnixTime) -> Self {
        let ticks = (t.0 as u64) * 10_000_000 + FILETIME_UNIX_DIFF_100NS;
        FileTime {
            low: (ticks & 0xffff_ffff) as u32,
            high: (ticks >> 32) as u32,
        }
    }

    pub fn to_unix_time(self) -> UnixTime {
        let ticks = ((self.high as u64) << 32) | self.low as u64;
        let secs = ticks.saturating_sub(FILETIME_UNIX_DIFF_100NS) / 10_000_000;
        UnixTime(secs as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_filetime() {
        let t = UnixTime(1_700_000_000);
        let ft = FileTime::from_unix_time(t);
        assert_eq!(ft.to_unix_time(), t);
    }

    #[test]
    fn unix_epoch_is_the_filetime_constant() {
        let ft = FileTime::from_unix_time(UnixTime(0));
        let ticks = ((ft.high as u64) << 32) | ft.low as u64;
        assert_eq!(ticks, FILETIME_UNIX_DIFF_100NS);
    }
}
