use thiserror::Error;

/// IdSet decode failure (§4.2, §7). Fatal for the state-property upload
/// that produced it, but never poisons the rest of the session.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdSetError {
    #[error("truncated idset wire data: expected at least {needed} more bytes, had {available}")]
    Truncated { needed: usize, available: usize },

    #[error("idset ranges for a replica are not strictly increasing")]
    NonMonotone,
}

pub type Result<T> = std::result::Result<T, IdSetError>;
