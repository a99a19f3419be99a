//! Error type for the ID codec (§4.1, §7).

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DtypError {
    #[error("wire value has {len} bytes, expected {expected}")]
    WrongLength { expected: usize, len: usize },

    #[error("replica id {0} has no known GUID")]
    UnknownReplicaId(u16),

    #[error("replica guid {0} is not registered")]
    UnknownReplicaGuid(crate::Guid),

    #[error("id of length {0} does not fit in a u64 (max 8 bytes)")]
    IdTooLong(usize),
}

pub type Result<T> = std::result::Result<T, DtypError>;
