//! The change-number / entry-id set algebra (§4.2): a compact
//! representation of sets of 48-bit global counters grouped by replica
//! GUID, with range-merge, membership, parse, and serialize operations.

mod error;
mod idset;
mod range;
mod raw;

pub use error::{IdSetError, Result};
pub use idset::IdSet;
pub use range::Range;
pub use raw::RawIdSet;
