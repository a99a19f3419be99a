//! Crate-wide error type, composed from the lower crates' errors and
//! mapped onto the RPC error codes at the dispatch boundary (§7).

use fxics_dtyp::DtypError;
use fxics_idset::IdSetError;
use fxics_msg::MsgError;
use fxics_rpc::ErrorCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Dtyp(#[from] DtypError),

    #[error(transparent)]
    IdSet(#[from] IdSetError),

    #[error(transparent)]
    Msg(#[from] MsgError),

    /// A handle did not resolve to an object of the expected kind, or did
    /// not resolve at all (§7).
    #[error("invalid handle or object kind")]
    InvalidObject,

    /// Malformed flags, inconsistent send-options, or any other
    /// caller-supplied parameter that fails validation (§7).
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A requested entity (source key, named property, replica) could
    /// not be resolved (§7).
    #[error("not found")]
    NotFound,

    /// A feature this core does not implement, e.g. hierarchy deletes or
    /// an ingest-only backend (§4.6, §7).
    #[error("unsupported: {0}")]
    NoSupport(&'static str),

    /// An RPC referenced a SyncContext/FtContext step that has not been
    /// reached yet (e.g. `GetBuffer` before `SyncConfigure`).
    #[error("not initialized")]
    NotInitialized,

    /// The store reported a failure while the producer was walking the
    /// hierarchy or a message table. The partial stream is discarded
    /// (§5 "Failure mid-stream").
    #[error("store error: {0}")]
    Store(String),
}

impl Error {
    /// Maps this error onto the RPC error code surfaced in a reply
    /// (§6, §7). `IdSet`/parse failures become `Malformed`, which the
    /// session state machine treats as fatal for the affected upload
    /// without poisoning the rest of the session.
    pub fn to_error_code(&self) -> ErrorCode {
        match self {
            Error::Dtyp(DtypError::UnknownReplicaId(_) | DtypError::UnknownReplicaGuid(_)) => {
                ErrorCode::NotFound
            }
            Error::Dtyp(_) => ErrorCode::InvalidParameter,
            Error::IdSet(_) => ErrorCode::Malformed,
            Error::Msg(_) => ErrorCode::InvalidParameter,
            Error::InvalidObject => ErrorCode::InvalidObject,
            Error::InvalidParameter(_) => ErrorCode::InvalidParameter,
            Error::NotFound => ErrorCode::NotFound,
            Error::NoSupport(_) => ErrorCode::NoSupport,
            Error::NotInitialized => ErrorCode::NotInitialized,
            Error::Store(_) => ErrorCode::InvalidObject,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
